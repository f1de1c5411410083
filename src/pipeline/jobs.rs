// Job queue operations: scan, drain, cleanup

use anyhow::Result;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::database::{Job, JobStatus};
use crate::pipeline::processor::{self, ProcessOutcome};
use crate::PipelineContext;

/// Terminal outcome of one job
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { recording_id: i64 },
    /// The file's recording was already stored
    Skipped,
    Failed { message: String },
}

/// One job's result within a batch
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: i64,
    pub outcome: JobOutcome,
}

/// Per-job results of one batch run
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<JobReport>,
}

impl BatchOutcome {
    pub fn completed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Completed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome == JobOutcome::Skipped)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Failed { .. }))
            .count()
    }

    /// Recordings created in this batch, for identity resolution
    pub fn new_recordings(&self) -> Vec<i64> {
        self.reports
            .iter()
            .filter_map(|r| match r.outcome {
                JobOutcome::Completed { recording_id } => Some(recording_id),
                _ => None,
            })
            .collect()
    }
}

/// Walk the audio root and enqueue a pending job for every audio file
/// not yet queued and not already processed. Returns the number of jobs
/// enqueued.
pub fn scan(ctx: &PipelineContext) -> Result<usize> {
    let root = &ctx.config.audio_root;
    if !root.is_dir() {
        debug!("Audio root {:?} does not exist yet", root);
        return Ok(0);
    }

    let mut files = Vec::new();
    collect_audio_files(root, &ctx.config.audio_extensions, &mut files)?;

    let mut enqueued = 0;
    for path in files {
        let file_path = path.to_string_lossy().into_owned();
        if ctx.db.job_exists(&file_path)? {
            continue;
        }
        let transcript_id = processor::derive_transcript_id(&path)?;
        if ctx.db.recording_exists(&transcript_id)? {
            continue;
        }
        if ctx.db.enqueue_job(&file_path)?.is_some() {
            info!("Enqueued {}", file_path);
            enqueued += 1;
        }
    }
    Ok(enqueued)
}

fn collect_audio_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_audio_files(&path, extensions, out)?;
        } else if has_audio_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_audio_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Process one job through the pipeline, recording the terminal status
pub fn process_job(ctx: &PipelineContext, job: &Job) -> Result<JobOutcome> {
    ctx.db
        .set_job_status(job.id, JobStatus::Processing, None)?;

    match processor::process_file(ctx, Path::new(&job.file_path)) {
        Ok(ProcessOutcome::Completed { recording_id, .. }) => {
            ctx.db
                .set_job_status(job.id, JobStatus::Completed, None)?;
            Ok(JobOutcome::Completed { recording_id })
        }
        Ok(ProcessOutcome::AlreadyProcessed) => {
            ctx.db
                .set_job_status(job.id, JobStatus::Completed, None)?;
            Ok(JobOutcome::Skipped)
        }
        Err(e) => {
            let message = format!("{:#}", e);
            warn!("Job {} failed: {}", job.id, message);
            ctx.db
                .set_job_status(job.id, JobStatus::Error, Some(&message))?;
            Ok(JobOutcome::Failed { message })
        }
    }
}

/// Process an explicit list of jobs, returning every job's outcome.
/// An unknown id reports as failed; a failing job is recorded as
/// `error` and never stops the batch.
pub fn process_batch(ctx: &PipelineContext, job_ids: &[i64]) -> Result<Vec<JobReport>> {
    let mut reports = Vec::with_capacity(job_ids.len());
    for &job_id in job_ids {
        let outcome = match ctx.db.get_job(job_id)? {
            Some(job) => process_job(ctx, &job)?,
            None => JobOutcome::Failed {
                message: format!("Job {} not found", job_id),
            },
        };
        reports.push(JobReport { job_id, outcome });
    }
    Ok(reports)
}

/// Drain every pending job
pub fn process_pending(ctx: &PipelineContext) -> Result<BatchOutcome> {
    let pending = ctx.db.jobs_with_status(JobStatus::Pending)?;
    let mut outcome = BatchOutcome::default();
    for job in &pending {
        let result = process_job(ctx, job)?;
        outcome.reports.push(JobReport {
            job_id: job.id,
            outcome: result,
        });
    }
    if !pending.is_empty() {
        info!(
            "Batch done: {} completed, {} skipped, {} failed",
            outcome.completed(),
            outcome.skipped(),
            outcome.failed()
        );
    }
    Ok(outcome)
}

/// Queue maintenance, run at startup:
/// jobs stuck in `processing` from an interrupted run go back to
/// `pending`, and non-completed jobs are deleted when their source file
/// has disappeared or their recording was already stored.
/// Returns (requeued, deleted).
pub fn cleanup(ctx: &PipelineContext) -> Result<(usize, usize)> {
    let mut requeued = 0;
    for job in ctx.db.jobs_with_status(JobStatus::Processing)? {
        ctx.db.set_job_status(job.id, JobStatus::Pending, None)?;
        requeued += 1;
    }

    let mut deleted = 0;
    for job in ctx.db.list_jobs()? {
        if job.status == JobStatus::Completed {
            continue;
        }
        let path = Path::new(&job.file_path);
        if !path.exists() {
            info!("Dropping job {}: source {} is gone", job.id, job.file_path);
            ctx.db.delete_job(job.id)?;
            deleted += 1;
            continue;
        }
        let transcript_id = processor::derive_transcript_id(path)?;
        if ctx.db.recording_exists(&transcript_id)? {
            info!("Dropping job {}: {} already processed", job.id, transcript_id);
            ctx.db.delete_job(job.id)?;
            deleted += 1;
        }
    }

    if requeued > 0 || deleted > 0 {
        info!("Cleanup: {} requeued, {} deleted", requeued, deleted);
    }
    Ok((requeued, deleted))
}
