// transcriptd - Audio ingestion pipeline with persistent speaker identities
//
// The pipeline turns recorded audio files into transcribed, speaker-attributed
// segments:
// - A job queue discovers unprocessed files and tracks per-file state
// - The segmentation engine splits one file into speech intervals (VAD)
// - Each clip goes through the transcription boundary
// - Per-recording clustering groups segment voice features
// - The identity resolver matches clusters against the persisted speaker
//   registry, creating or merging long-lived identities

pub mod audio;
pub mod clustering;
pub mod config;
pub mod context;
pub mod database;
pub mod features;
pub mod identity;
pub mod pipeline;
pub mod segmentation;
pub mod transcription;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use database::DatabaseManager;
