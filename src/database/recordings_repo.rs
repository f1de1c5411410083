// Recordings repository for transcriptd
// Handles recording rows and their batch-inserted segments

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{NewSegment, Recording};
use super::DatabaseManager;

impl DatabaseManager {
    /// Insert a recording and its segments in a single transaction.
    /// Returns the new recording id.
    pub fn insert_recording_with_segments(
        &self,
        filename: &str,
        transcript_id: &str,
        duration_sec: f64,
        segments: &[NewSegment],
    ) -> Result<i64> {
        self.with_connection_mut(|conn| {
            insert_recording_with_segments_impl(conn, filename, transcript_id, duration_sec, segments)
        })
    }

    /// Get a recording by id
    pub fn get_recording(&self, id: i64) -> Result<Option<Recording>> {
        self.with_connection(|conn| get_recording_impl(conn, id))
    }

    /// Get all recordings, most recent first
    pub fn list_recordings(&self) -> Result<Vec<Recording>> {
        self.with_connection(|conn| list_recordings_impl(conn))
    }

    /// Check the dedupe key: does a recording with this transcript_id exist?
    pub fn recording_exists(&self, transcript_id: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT id FROM recordings WHERE transcript_id = ?",
                    params![transcript_id],
                    |row| row.get(0),
                )
                .optional()
                .context("Failed to check for existing recording")?;
            Ok(found.is_some())
        })
    }

    /// Delete a recording; segments cascade
    pub fn delete_recording(&self, id: i64) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM recordings WHERE id = ?", params![id])
                .context("Failed to delete recording")?;
            Ok(())
        })
    }
}

fn insert_recording_with_segments_impl(
    conn: &mut Connection,
    filename: &str,
    transcript_id: &str,
    duration_sec: f64,
    segments: &[NewSegment],
) -> Result<i64> {
    let tx = conn.transaction().context("Failed to begin transaction")?;

    tx.execute(
        "INSERT INTO recordings (filename, transcript_id, duration_sec) VALUES (?, ?, ?)",
        params![filename, transcript_id, duration_sec],
    )
    .context("Failed to insert recording")?;

    let recording_id = tx.last_insert_rowid();

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO segments (recording_id, start_time, end_time, transcript, clip_path)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .context("Failed to prepare segment insert")?;

        for segment in segments {
            stmt.execute(params![
                recording_id,
                segment.start_time,
                segment.end_time,
                segment.transcript,
                segment.clip_path,
            ])
            .context("Failed to insert segment")?;
        }
    }

    tx.commit().context("Failed to commit recording insert")?;
    Ok(recording_id)
}

fn get_recording_impl(conn: &Connection, id: i64) -> Result<Option<Recording>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, filename, transcript_id, duration_sec, created_at
             FROM recordings WHERE id = ?",
        )
        .context("Failed to prepare get_recording query")?;

    stmt.query_row(params![id], recording_from_row)
        .optional()
        .context("Failed to get recording")
}

fn list_recordings_impl(conn: &Connection) -> Result<Vec<Recording>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, filename, transcript_id, duration_sec, created_at
             FROM recordings ORDER BY transcript_id DESC",
        )
        .context("Failed to prepare list_recordings query")?;

    let rows = stmt
        .query_map([], recording_from_row)
        .context("Failed to query recordings")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect recordings")
}

fn recording_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get(0)?,
        filename: row.get(1)?,
        transcript_id: row.get(2)?,
        duration_sec: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_db() -> (tempfile::TempDir, DatabaseManager) {
        let dir = tempdir().unwrap();
        let db = DatabaseManager::new(dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn sample_segments() -> Vec<NewSegment> {
        vec![
            NewSegment {
                start_time: 0.9,
                end_time: 4.0,
                transcript: Some("hello there".to_string()),
                clip_path: "/clips/2025-08-01_09-00-00_seg000.wav".to_string(),
            },
            NewSegment {
                start_time: 5.5,
                end_time: 7.2,
                transcript: None,
                clip_path: "/clips/2025-08-01_09-00-00_seg001.wav".to_string(),
            },
        ]
    }

    #[test]
    fn test_insert_recording_with_segments() {
        let (_dir, db) = create_test_db();

        let id = db
            .insert_recording_with_segments("09-00-00.wav", "2025-08-01_09-00-00", 10.0, &sample_segments())
            .unwrap();

        let recording = db.get_recording(id).unwrap().unwrap();
        assert_eq!(recording.transcript_id, "2025-08-01_09-00-00");

        let segments = db.segments_for_recording(id).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(segments[0].speaker_id.is_none());
        assert!(segments[0].end_time > segments[0].start_time);
    }

    #[test]
    fn test_transcript_id_unique() {
        let (_dir, db) = create_test_db();

        db.insert_recording_with_segments("a.wav", "2025-08-01_09-00-00", 10.0, &[])
            .unwrap();
        let result =
            db.insert_recording_with_segments("a.wav", "2025-08-01_09-00-00", 10.0, &[]);
        assert!(result.is_err());
        assert!(db.recording_exists("2025-08-01_09-00-00").unwrap());
    }

    #[test]
    fn test_delete_cascades_to_segments() {
        let (_dir, db) = create_test_db();

        let id = db
            .insert_recording_with_segments("a.wav", "2025-08-01_09-00-00", 10.0, &sample_segments())
            .unwrap();
        db.delete_recording(id).unwrap();

        assert!(db.get_recording(id).unwrap().is_none());
        assert!(db.segments_for_recording(id).unwrap().is_empty());
    }
}
