// Database models - Recordings and segments

use serde::{Deserialize, Serialize};

/// One processed source audio file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub filename: String,
    /// Dedupe key derived from the source path (`<date>_<time>`)
    pub transcript_id: String,
    pub duration_sec: f64,
    pub created_at: String,
}

/// A speech interval of a recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    pub recording_id: i64,
    pub start_time: f64,
    pub end_time: f64,
    /// Null until identity resolution has run for the recording
    pub speaker_id: Option<String>,
    pub transcript: Option<String>,
    /// Exported clip; also the source for feature extraction
    pub clip_path: String,
    /// Manually assigned speaker survives resolution re-runs
    pub speaker_locked: bool,
}

/// Segment data prior to insertion (the id is assigned by the database)
#[derive(Debug, Clone)]
pub struct NewSegment {
    pub start_time: f64,
    pub end_time: f64,
    pub transcript: Option<String>,
    pub clip_path: String,
}
