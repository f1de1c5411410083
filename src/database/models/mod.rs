// Database models - Re-exports all domain-specific models
//
// Split into focused files by domain:
// - job.rs: processing queue entries
// - recording.rs: recordings and their segments
// - speaker.rs: persistent speaker identities

mod job;
mod recording;
mod speaker;

pub use job::{Job, JobStatus};
pub use recording::{NewSegment, Recording, Segment};
pub use speaker::Speaker;
