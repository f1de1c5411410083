// Segmentation engine for transcriptd
// Turns one audio file into an ordered list of exported speech clips

pub mod vad;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::audio::{self, AudioBuffer};
pub use vad::{EnergyVad, FallbackVad, SpeechInterval, VadEngine, WebRtcVad};

/// One padded speech interval with its exported clip
#[derive(Debug, Clone)]
pub struct ClipSegment {
    pub start: f64,
    pub end: f64,
    pub clip_path: PathBuf,
}

/// Result of splitting one file
#[derive(Debug, Clone)]
pub struct SegmentationOutput {
    pub clips: Vec<ClipSegment>,
    /// Sample-accurate duration of the source audio
    pub duration_sec: f64,
}

/// Splits audio files into speech segments:
/// detect -> merge close intervals -> pad -> export clips
pub struct SegmentationEngine {
    vad: Box<dyn VadEngine>,
    /// Intervals closer than this are merged (seconds)
    merge_gap_sec: f64,
    /// Padding added to each side of a merged interval (seconds)
    pad_sec: f64,
}

impl SegmentationEngine {
    pub fn new(vad: Box<dyn VadEngine>, merge_gap_sec: f64, pad_sec: f64) -> Self {
        Self {
            vad,
            merge_gap_sec,
            pad_sec,
        }
    }

    /// Split `input_path` into speech segments, exporting one clip per
    /// interval named `<prefix>_seg<NNN>.wav` under `out_dir`.
    ///
    /// Zero detected intervals is a valid empty result. A clip that fails
    /// to export is dropped from the result; a detector failure is fatal
    /// for the whole file.
    pub fn split_file(
        &self,
        input_path: &Path,
        out_dir: &Path,
        prefix: &str,
    ) -> Result<SegmentationOutput> {
        let buffer = audio::load_wav(input_path)?;
        let duration = buffer.duration_sec();
        info!(
            "Segmenting {:?} ({:.1}s at {} Hz)",
            input_path, duration, buffer.sample_rate
        );

        let raw = self
            .vad
            .detect(&buffer.samples, buffer.sample_rate)
            .with_context(|| format!("Voice activity detection failed for {:?}", input_path))?;

        let intervals = self.merge_and_pad(&raw, duration);
        debug!(
            "{} raw intervals -> {} merged+padded",
            raw.len(),
            intervals.len()
        );

        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create segment directory {:?}", out_dir))?;

        let mut results = Vec::with_capacity(intervals.len());
        for (i, interval) in intervals.iter().enumerate() {
            let clip_path = out_dir.join(format!("{}_seg{:03}.wav", prefix, i));
            if let Err(e) = self.export_clip(&buffer, interval, &clip_path) {
                warn!("Dropping segment {}: {:#}", i, e);
                continue;
            }
            results.push(ClipSegment {
                start: interval.start,
                end: interval.end,
                clip_path,
            });
        }

        Ok(SegmentationOutput {
            clips: results,
            duration_sec: duration,
        })
    }

    /// Merge close-together intervals, then pad and clamp to the duration
    pub fn merge_and_pad(&self, raw: &[SpeechInterval], duration: f64) -> Vec<SpeechInterval> {
        let merged = merge_intervals(raw, self.merge_gap_sec);
        merged
            .into_iter()
            .map(|iv| SpeechInterval {
                start: (iv.start - self.pad_sec).max(0.0),
                end: (iv.end + self.pad_sec).min(duration),
            })
            .collect()
    }

    fn export_clip(
        &self,
        buffer: &AudioBuffer,
        interval: &SpeechInterval,
        clip_path: &Path,
    ) -> Result<()> {
        let samples = buffer.slice(interval.start, interval.end);
        audio::write_wav(clip_path, samples, buffer.sample_rate)
    }
}

/// Single left-to-right sweep: an interval is merged into its predecessor
/// when the gap between them is at most `max_gap` seconds.
pub fn merge_intervals(intervals: &[SpeechInterval], max_gap: f64) -> Vec<SpeechInterval> {
    let mut sorted: Vec<SpeechInterval> = intervals.to_vec();
    sorted.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<SpeechInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(prev) if interval.start - prev.end <= max_gap => {
                prev.end = interval.end;
            }
            _ => merged.push(interval),
        }
    }
    merged
}
