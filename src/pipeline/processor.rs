// Single-file processing: segmentation, transcription, persistence

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::path::Path;

use crate::database::NewSegment;
use crate::PipelineContext;

/// Result of processing one audio file
#[derive(Debug)]
pub enum ProcessOutcome {
    Completed {
        recording_id: i64,
        segment_count: usize,
    },
    /// A recording with the same transcript id already exists
    AlreadyProcessed,
}

/// Dedupe key for a recording: `<parent-dir>_<file-stem>`.
///
/// Device uploads land as `<device-serial>/<timestamp>.wav`, so the pair
/// is stable across re-scans while stems alone collide across devices.
pub fn derive_transcript_id(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("No file stem in {:?}", path))?;
    let parent = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str());
    match parent {
        Some(dir) => Ok(format!("{}_{}", dir, stem)),
        None => Ok(stem.to_string()),
    }
}

/// Run the full pipeline for one audio file: detect speech, export
/// per-segment clips, transcribe each clip, and persist the recording
/// with its segments in one transaction.
///
/// A clip whose transcription fails is dropped from the stored
/// recording; segmentation or persistence failures fail the whole
/// file. If every clip fails, the recording is still stored with zero
/// segments and the job completes.
pub fn process_file(ctx: &PipelineContext, path: &Path) -> Result<ProcessOutcome> {
    let transcript_id = derive_transcript_id(path)?;
    if ctx.db.recording_exists(&transcript_id)? {
        info!("Skipping {:?}: transcript {} already stored", path, transcript_id);
        return Ok(ProcessOutcome::AlreadyProcessed);
    }

    let engine = ctx.segmentation_engine();
    let output = engine.split_file(path, &ctx.config.segments_dir, &transcript_id)?;

    let mut segments = Vec::with_capacity(output.clips.len());
    for clip in &output.clips {
        let transcript = match ctx.transcriber.transcribe(&clip.clip_path) {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!("Dropping clip {:?}: transcription failed: {:#}", clip.clip_path, e);
                continue;
            }
        };
        segments.push(NewSegment {
            start_time: clip.start,
            end_time: clip.end,
            transcript,
            clip_path: clip.clip_path.to_string_lossy().into_owned(),
        });
    }

    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let recording_id = ctx.db.insert_recording_with_segments(
        &filename,
        &transcript_id,
        output.duration_sec,
        &segments,
    )?;

    info!(
        "Processed {:?}: recording {} with {} segments",
        path,
        recording_id,
        segments.len()
    );
    Ok(ProcessOutcome::Completed {
        recording_id,
        segment_count: segments.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_transcript_id_includes_parent_dir() {
        let id = derive_transcript_id(Path::new("/audio/DEV123/2025-08-01_09-00-00.wav")).unwrap();
        assert_eq!(id, "DEV123_2025-08-01_09-00-00");
    }

    #[test]
    fn test_transcript_id_same_stem_different_dirs() {
        let a = derive_transcript_id(Path::new("/audio/DEV1/take.wav")).unwrap();
        let b = derive_transcript_id(Path::new("/audio/DEV2/take.wav")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_transcript_id_bare_filename() {
        let id = derive_transcript_id(&PathBuf::from("take.wav")).unwrap();
        assert_eq!(id, "take");
    }
}
