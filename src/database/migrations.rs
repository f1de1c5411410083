// Database migrations for transcriptd
// Creates and updates the database schema

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Run all necessary migrations to bring the database up to date
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    // Check if schema_version table exists
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    ).unwrap_or(false);

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    ).unwrap_or(0);

    Ok(version)
}

/// Initial schema creation (version 1)
fn migrate_v1(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v1");

    conn.execute_batch(r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Jobs table: per-file processing state machine
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_path TEXT UNIQUE NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            error_message TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Recordings table: one row per processed source file
        CREATE TABLE IF NOT EXISTS recordings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL,
            transcript_id TEXT UNIQUE NOT NULL,
            duration_sec REAL NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Segments table: speech intervals of a recording
        CREATE TABLE IF NOT EXISTS segments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recording_id INTEGER NOT NULL,
            start_time REAL NOT NULL,
            end_time REAL NOT NULL,
            speaker_id TEXT,
            transcript TEXT,
            clip_path TEXT NOT NULL,
            FOREIGN KEY (recording_id) REFERENCES recordings(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_segments_recording_id
        ON segments(recording_id);

        CREATE INDEX IF NOT EXISTS idx_segments_speaker_id
        ON segments(speaker_id);

        -- Speakers table: long-lived global identities
        CREATE TABLE IF NOT EXISTS speakers (
            id TEXT PRIMARY KEY NOT NULL,
            label TEXT,
            aliases TEXT NOT NULL DEFAULT '[]',
            first_seen TEXT,
            last_seen TEXT
        );

        -- Bounded exemplar set per speaker (max 10 rows per speaker,
        -- enforced by the identity resolver)
        CREATE TABLE IF NOT EXISTS speaker_exemplars (
            speaker_id TEXT NOT NULL,
            segment_id INTEGER NOT NULL,
            PRIMARY KEY (speaker_id, segment_id),
            FOREIGN KEY (speaker_id) REFERENCES speakers(id) ON DELETE CASCADE,
            FOREIGN KEY (segment_id) REFERENCES segments(id) ON DELETE CASCADE
        );

        INSERT INTO schema_version (version) VALUES (1);
    "#).context("Failed to run migration v1")?;

    Ok(())
}

/// Version 2: manual speaker assignments survive resolution re-runs
fn migrate_v2(conn: &Connection) -> Result<()> {
    log::info!("Running database migration v2");

    conn.execute_batch(r#"
        ALTER TABLE segments ADD COLUMN speaker_locked INTEGER NOT NULL DEFAULT 0;

        INSERT INTO schema_version (version) VALUES (2);
    "#).context("Failed to run migration v2")?;

    Ok(())
}
