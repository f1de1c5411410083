// Jobs repository for transcriptd
// Tracks the per-file processing state machine

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Job, JobStatus};
use super::DatabaseManager;

impl DatabaseManager {
    /// Queue a new pending job for a file path.
    /// Returns None if the path is already queued (unique constraint).
    pub fn enqueue_job(&self, file_path: &str) -> Result<Option<i64>> {
        self.with_connection(|conn| enqueue_job_impl(conn, file_path))
    }

    /// Get a job by id
    pub fn get_job(&self, id: i64) -> Result<Option<Job>> {
        self.with_connection(|conn| get_job_impl(conn, id))
    }

    /// Get all jobs, most recent first
    pub fn list_jobs(&self) -> Result<Vec<Job>> {
        self.with_connection(|conn| list_jobs_impl(conn, None))
    }

    /// Get all jobs with the given status, oldest first
    pub fn jobs_with_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        self.with_connection(|conn| list_jobs_impl(conn, Some(status)))
    }

    /// Check whether a job already exists for a file path
    pub fn job_exists(&self, file_path: &str) -> Result<bool> {
        self.with_connection(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT id FROM jobs WHERE file_path = ?",
                    params![file_path],
                    |row| row.get(0),
                )
                .optional()
                .context("Failed to check for existing job")?;
            Ok(found.is_some())
        })
    }

    /// Transition a job to a new status, replacing any stored error message
    pub fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.with_connection(|conn| set_job_status_impl(conn, id, status, error_message))
    }

    /// Delete a job
    pub fn delete_job(&self, id: i64) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM jobs WHERE id = ?", params![id])
                .context("Failed to delete job")?;
            Ok(())
        })
    }
}

fn enqueue_job_impl(conn: &Connection, file_path: &str) -> Result<Option<i64>> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO jobs (file_path, status) VALUES (?, 'pending')",
            params![file_path],
        )
        .context("Failed to enqueue job")?;

    if inserted == 0 {
        return Ok(None);
    }
    Ok(Some(conn.last_insert_rowid()))
}

fn get_job_impl(conn: &Connection, id: i64) -> Result<Option<Job>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, file_path, status, error_message, created_at FROM jobs WHERE id = ?",
        )
        .context("Failed to prepare get_job query")?;

    let result = stmt
        .query_row(params![id], job_from_row)
        .optional()
        .context("Failed to get job")?;

    Ok(result)
}

fn list_jobs_impl(conn: &Connection, status: Option<JobStatus>) -> Result<Vec<Job>> {
    let (query, filter) = match status {
        Some(s) => (
            "SELECT id, file_path, status, error_message, created_at
             FROM jobs WHERE status = ? ORDER BY created_at ASC",
            Some(s.as_str().to_string()),
        ),
        None => (
            "SELECT id, file_path, status, error_message, created_at
             FROM jobs ORDER BY created_at DESC",
            None,
        ),
    };

    let mut stmt = conn.prepare(query).context("Failed to prepare jobs query")?;

    let rows = match filter {
        Some(s) => stmt.query_map(params![s], job_from_row),
        None => stmt.query_map([], job_from_row),
    }
    .context("Failed to query jobs")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect jobs")
}

fn set_job_status_impl(
    conn: &Connection,
    id: i64,
    status: JobStatus,
    error_message: Option<&str>,
) -> Result<()> {
    conn.execute(
        "UPDATE jobs SET status = ?, error_message = ? WHERE id = ?",
        params![status.as_str(), error_message, id],
    )
    .context("Failed to update job status")?;
    Ok(())
}

fn job_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Job> {
    let status_text: String = row.get(2)?;
    Ok(Job {
        id: row.get(0)?,
        file_path: row.get(1)?,
        status: JobStatus::parse(&status_text).unwrap_or(JobStatus::Error),
        error_message: row.get(3)?,
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

    #[test]
    fn test_enqueue_and_get() {
        let (_dir, db) = create_test_db();

        let id = db.enqueue_job("/audio/2025-08-01/09-00-00.wav").unwrap().unwrap();
        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.file_path, "/audio/2025-08-01/09-00-00.wav");
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_enqueue_duplicate_path_is_ignored() {
        let (_dir, db) = create_test_db();

        assert!(db.enqueue_job("/audio/a.wav").unwrap().is_some());
        assert!(db.enqueue_job("/audio/a.wav").unwrap().is_none());
        assert_eq!(db.list_jobs().unwrap().len(), 1);
    }

    #[test]
    fn test_status_transitions_keep_error_message() {
        let (_dir, db) = create_test_db();

        let id = db.enqueue_job("/audio/b.wav").unwrap().unwrap();
        db.set_job_status(id, JobStatus::Processing, None).unwrap();
        db.set_job_status(id, JobStatus::Error, Some("recognizer unavailable"))
            .unwrap();

        let job = db.get_job(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error_message.as_deref(), Some("recognizer unavailable"));
    }

    #[test]
    fn test_jobs_with_status() {
        let (_dir, db) = create_test_db();

        let a = db.enqueue_job("/audio/a.wav").unwrap().unwrap();
        let _b = db.enqueue_job("/audio/b.wav").unwrap().unwrap();
        db.set_job_status(a, JobStatus::Completed, None).unwrap();

        let pending = db.jobs_with_status(JobStatus::Pending).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].file_path, "/audio/b.wav");
    }
}
