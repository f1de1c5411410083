// Speakers repository for transcriptd
// Persistent identity rows and their bounded exemplar sets

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::Speaker;
use super::DatabaseManager;

/// Upper bound on stored exemplars per speaker
pub const MAX_EXEMPLARS: usize = 10;

impl DatabaseManager {
    /// Get all registered speakers
    pub fn list_speakers(&self) -> Result<Vec<Speaker>> {
        self.with_connection(list_speakers_impl)
    }

    /// Get a speaker by id
    pub fn get_speaker(&self, id: &str) -> Result<Option<Speaker>> {
        self.with_connection(|conn| get_speaker_impl(conn, id))
    }

    /// Insert or update a speaker row
    pub fn upsert_speaker(&self, speaker: &Speaker) -> Result<()> {
        self.with_connection(|conn| upsert_speaker_impl(conn, speaker))
    }

    /// Set a speaker's display label only
    pub fn relabel_speaker(&self, id: &str, new_label: &str) -> Result<()> {
        self.with_connection(|conn| {
            let updated = conn
                .execute(
                    "UPDATE speakers SET label = ? WHERE id = ?",
                    params![new_label, id],
                )
                .context("Failed to relabel speaker")?;
            if updated == 0 {
                anyhow::bail!("Speaker not found: {}", id);
            }
            Ok(())
        })
    }

    /// Segment ids of a speaker's current exemplar set
    pub fn exemplar_segment_ids(&self, speaker_id: &str) -> Result<Vec<i64>> {
        self.with_connection(|conn| exemplar_segment_ids_impl(conn, speaker_id))
    }

    /// Replace a speaker's exemplar set, enforcing the bound
    pub fn replace_exemplars(&self, speaker_id: &str, segment_ids: &[i64]) -> Result<()> {
        self.with_connection(|conn| replace_exemplars_impl(conn, speaker_id, segment_ids))
    }

    /// Next unused auto-generated speaker id, scanned from existing ids
    pub fn next_speaker_index(&self) -> Result<u64> {
        self.with_connection(next_speaker_index_impl)
    }
}

pub(crate) fn list_speakers_impl(conn: &Connection) -> Result<Vec<Speaker>> {
    let mut stmt = conn
        .prepare("SELECT id, label, aliases, first_seen, last_seen FROM speakers ORDER BY id")
        .context("Failed to prepare speakers query")?;

    let rows = stmt
        .query_map([], speaker_from_row)
        .context("Failed to query speakers")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect speakers")
}

pub(crate) fn get_speaker_impl(conn: &Connection, id: &str) -> Result<Option<Speaker>> {
    let mut stmt = conn
        .prepare("SELECT id, label, aliases, first_seen, last_seen FROM speakers WHERE id = ?")
        .context("Failed to prepare get_speaker query")?;

    stmt.query_row(params![id], speaker_from_row)
        .optional()
        .context("Failed to get speaker")
}

pub(crate) fn upsert_speaker_impl(conn: &Connection, speaker: &Speaker) -> Result<()> {
    let aliases = serde_json::to_string(&speaker.aliases)
        .context("Failed to serialize speaker aliases")?;

    conn.execute(
        "INSERT INTO speakers (id, label, aliases, first_seen, last_seen)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             label = excluded.label,
             aliases = excluded.aliases,
             first_seen = excluded.first_seen,
             last_seen = excluded.last_seen",
        params![
            speaker.id,
            speaker.label,
            aliases,
            speaker.first_seen,
            speaker.last_seen,
        ],
    )
    .context("Failed to upsert speaker")?;
    Ok(())
}

pub(crate) fn exemplar_segment_ids_impl(conn: &Connection, speaker_id: &str) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT segment_id FROM speaker_exemplars WHERE speaker_id = ?")
        .context("Failed to prepare exemplar query")?;

    let rows = stmt
        .query_map(params![speaker_id], |row| row.get(0))
        .context("Failed to query exemplars")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect exemplars")
}

pub(crate) fn replace_exemplars_impl(
    conn: &Connection,
    speaker_id: &str,
    segment_ids: &[i64],
) -> Result<()> {
    conn.execute(
        "DELETE FROM speaker_exemplars WHERE speaker_id = ?",
        params![speaker_id],
    )
    .context("Failed to clear exemplars")?;

    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO speaker_exemplars (speaker_id, segment_id) VALUES (?, ?)")
        .context("Failed to prepare exemplar insert")?;

    for segment_id in segment_ids.iter().take(MAX_EXEMPLARS) {
        stmt.execute(params![speaker_id, segment_id])
            .context("Failed to insert exemplar")?;
    }
    Ok(())
}

pub(crate) fn next_speaker_index_impl(conn: &Connection) -> Result<u64> {
    let mut stmt = conn
        .prepare("SELECT id FROM speakers")
        .context("Failed to prepare speaker id scan")?;

    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("Failed to scan speaker ids")?;

    let mut next = 0u64;
    for id in ids {
        let id = id.context("Failed to read speaker id")?;
        if let Some(index) = Speaker::auto_index(&id) {
            next = next.max(index + 1);
        }
    }
    Ok(next)
}

fn speaker_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Speaker> {
    let aliases_text: String = row.get(2)?;
    Ok(Speaker {
        id: row.get(0)?,
        label: row.get(1)?,
        aliases: serde_json::from_str(&aliases_text).unwrap_or_default(),
        first_seen: row.get(3)?,
        last_seen: row.get(4)?,
    })
}
