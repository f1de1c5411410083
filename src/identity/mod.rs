// Identity resolution for transcriptd
// Matches per-recording clusters against the persisted speaker registry

pub mod registry;
mod resolver;

pub use resolver::{
    merge_speakers, reassign_segment, relabel_speaker, resolve_recording, ResolutionSummary,
    SegmentSuggestion,
};
