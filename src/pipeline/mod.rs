// Processing pipeline: queue scanning, per-file processing, watcher loop

pub mod jobs;
pub mod processor;
pub mod watcher;

pub use jobs::{BatchOutcome, JobOutcome, JobReport};
pub use processor::{derive_transcript_id, process_file, ProcessOutcome};
