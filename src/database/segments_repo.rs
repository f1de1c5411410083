// Segments repository for transcriptd
// Segment lookups and speaker reference updates

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::Segment;
use super::DatabaseManager;

impl DatabaseManager {
    /// Get all segments of a recording, ordered by start time
    pub fn segments_for_recording(&self, recording_id: i64) -> Result<Vec<Segment>> {
        self.with_connection(|conn| segments_for_recording_impl(conn, recording_id))
    }

    /// Get a segment by id
    pub fn get_segment(&self, id: i64) -> Result<Option<Segment>> {
        self.with_connection(|conn| get_segment_impl(conn, id))
    }

    /// Set a single segment's speaker reference.
    /// `lock` marks the assignment as manual so resolution re-runs keep it.
    pub fn set_segment_speaker(&self, id: i64, speaker_id: &str, lock: bool) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "UPDATE segments SET speaker_id = ?, speaker_locked = ? WHERE id = ?",
                params![speaker_id, lock as i32, id],
            )
            .context("Failed to set segment speaker")?;
            Ok(())
        })
    }

    /// Count segments referencing a speaker
    pub fn segment_count_for_speaker(&self, speaker_id: &str) -> Result<i64> {
        self.with_connection(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM segments WHERE speaker_id = ?",
                params![speaker_id],
                |row| row.get(0),
            )
            .context("Failed to count segments for speaker")
        })
    }
}

pub(crate) fn segments_for_recording_impl(
    conn: &Connection,
    recording_id: i64,
) -> Result<Vec<Segment>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, recording_id, start_time, end_time, speaker_id, transcript,
                    clip_path, speaker_locked
             FROM segments WHERE recording_id = ? ORDER BY start_time ASC",
        )
        .context("Failed to prepare segments query")?;

    let rows = stmt
        .query_map(params![recording_id], segment_from_row)
        .context("Failed to query segments")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect segments")
}

fn get_segment_impl(conn: &Connection, id: i64) -> Result<Option<Segment>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, recording_id, start_time, end_time, speaker_id, transcript,
                    clip_path, speaker_locked
             FROM segments WHERE id = ?",
        )
        .context("Failed to prepare get_segment query")?;

    stmt.query_row(params![id], segment_from_row)
        .optional()
        .context("Failed to get segment")
}

pub(crate) fn segment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Segment> {
    Ok(Segment {
        id: row.get(0)?,
        recording_id: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        speaker_id: row.get(4)?,
        transcript: row.get(5)?,
        clip_path: row.get(6)?,
        speaker_locked: row.get::<_, i32>(7)? != 0,
    })
}
