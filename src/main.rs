// transcriptd - recording processing daemon
// Watches an audio drop directory, segments and transcribes new
// recordings, and resolves speaker identities across recordings.

use anyhow::Result;
use log::info;
use std::sync::Arc;

use transcriptd::pipeline::watcher;
use transcriptd::{PipelineConfig, PipelineContext};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_env()?;
    info!(
        "Starting transcriptd (audio root {:?}, db {:?})",
        config.audio_root, config.db_path
    );

    let ctx = Arc::new(PipelineContext::open(config)?);
    watcher::run(ctx).await
}
