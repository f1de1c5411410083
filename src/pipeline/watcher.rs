// Polling watcher: periodically scans the audio root, drains the job
// queue, and kicks off identity resolution for new recordings

use anyhow::Result;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use crate::identity;
use crate::pipeline::jobs::{self, BatchOutcome};
use crate::PipelineContext;

/// One scan-and-drain cycle. Synchronous; the async loop wraps it in
/// `spawn_blocking`.
pub fn run_tick(ctx: &PipelineContext) -> Result<BatchOutcome> {
    let enqueued = jobs::scan(ctx)?;
    if enqueued > 0 {
        info!("Scan found {} new files", enqueued);
    }
    jobs::process_pending(ctx)
}

/// Run the watcher until the process is stopped.
///
/// Identity resolution is fire-and-forget: each new recording resolves
/// on its own blocking task, and a failure there is logged without
/// affecting the job's completed status.
pub async fn run(ctx: Arc<PipelineContext>) -> Result<()> {
    {
        let ctx = ctx.clone();
        tokio::task::spawn_blocking(move || jobs::cleanup(&ctx)).await??;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(ctx.config.poll_interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(
        "Watching {:?} every {}s",
        ctx.config.audio_root, ctx.config.poll_interval_secs
    );

    loop {
        interval.tick().await;

        let tick_ctx = ctx.clone();
        let outcome = match tokio::task::spawn_blocking(move || run_tick(&tick_ctx)).await? {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Watcher tick failed: {:#}", e);
                continue;
            }
        };

        for recording_id in outcome.new_recordings() {
            let resolve_ctx = ctx.clone();
            tokio::spawn(async move {
                let result = tokio::task::spawn_blocking(move || {
                    identity::resolve_recording(&resolve_ctx, recording_id)
                })
                .await;
                match result {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => error!("Resolution failed for recording {}: {:#}", recording_id, e),
                    Err(e) => error!("Resolution task panicked for recording {}: {}", recording_id, e),
                }
            });
        }
    }
}
