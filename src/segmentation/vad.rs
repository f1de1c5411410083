// Voice-activity detection backends
// Frame-level classifiers producing raw speech intervals

use anyhow::{anyhow, Result};
use log::{debug, warn};
use webrtc_vad::{SampleRate, Vad, VadMode};

/// A raw speech interval in seconds, before merging and padding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechInterval {
    pub start: f64,
    pub end: f64,
}

/// Frame-level voice-activity detector
pub trait VadEngine: Send + Sync {
    /// Return raw speech timestamp intervals for mono samples
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<SpeechInterval>>;
}

/// Frame duration used by both backends
const FRAME_MS: usize = 30;

/// WebRTC frame classifier (default detector)
pub struct WebRtcVad {
    aggressiveness: u8,
}

impl WebRtcVad {
    pub fn new(aggressiveness: u8) -> Self {
        Self { aggressiveness }
    }
}

impl VadEngine for WebRtcVad {
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<SpeechInterval>> {
        let vad_sample_rate = match sample_rate {
            8000 => SampleRate::Rate8kHz,
            16000 => SampleRate::Rate16kHz,
            32000 => SampleRate::Rate32kHz,
            48000 => SampleRate::Rate48kHz,
            other => {
                return Err(anyhow!(
                    "Unsupported sample rate for VAD: {} Hz (supported: 8000, 16000, 32000, 48000)",
                    other
                ));
            }
        };

        let vad_mode = match self.aggressiveness {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            _ => VadMode::VeryAggressive,
        };

        let mut vad = Vad::new_with_rate_and_mode(vad_sample_rate, vad_mode);

        let frame_size = (sample_rate as usize * FRAME_MS) / 1000;
        let samples_i16: Vec<i16> = samples
            .iter()
            .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
            .collect();

        let mut speech_flags = Vec::with_capacity(samples_i16.len() / frame_size + 1);
        for frame in samples_i16.chunks(frame_size) {
            if frame.len() != frame_size {
                break; // Skip the trailing incomplete frame
            }
            speech_flags.push(vad.is_voice_segment(frame).unwrap_or(false));
        }

        let intervals = flags_to_intervals(&speech_flags, frame_size, sample_rate);
        debug!(
            "WebRTC VAD: {} frames -> {} raw intervals",
            speech_flags.len(),
            intervals.len()
        );
        Ok(intervals)
    }
}

/// Energy threshold classifier (fallback when the frame detector
/// cannot run, e.g. unsupported sample rates)
pub struct EnergyVad {
    threshold: f32,
}

impl EnergyVad {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl VadEngine for EnergyVad {
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<SpeechInterval>> {
        let frame_size = ((sample_rate as usize * FRAME_MS) / 1000).max(1);

        let mut speech_flags = Vec::with_capacity(samples.len() / frame_size + 1);
        for frame in samples.chunks(frame_size) {
            if frame.len() != frame_size {
                break;
            }
            let energy = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
            speech_flags.push(energy.sqrt() > self.threshold);
        }

        let intervals = flags_to_intervals(&speech_flags, frame_size, sample_rate);
        debug!(
            "Energy VAD: {} frames -> {} raw intervals",
            speech_flags.len(),
            intervals.len()
        );
        Ok(intervals)
    }
}

/// Primary detector with a fallback for input the primary cannot
/// process, such as a WAV at a sample rate the frame classifier does
/// not support
pub struct FallbackVad {
    primary: Box<dyn VadEngine>,
    fallback: Box<dyn VadEngine>,
}

impl FallbackVad {
    pub fn new(primary: Box<dyn VadEngine>, fallback: Box<dyn VadEngine>) -> Self {
        Self { primary, fallback }
    }
}

impl VadEngine for FallbackVad {
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<SpeechInterval>> {
        match self.primary.detect(samples, sample_rate) {
            Ok(intervals) => Ok(intervals),
            Err(e) => {
                warn!("Primary detector failed ({:#}), using fallback", e);
                self.fallback.detect(samples, sample_rate)
            }
        }
    }
}

/// Collapse per-frame speech flags into contiguous intervals
fn flags_to_intervals(flags: &[bool], frame_size: usize, sample_rate: u32) -> Vec<SpeechInterval> {
    let frame_duration = frame_size as f64 / sample_rate as f64;
    let mut intervals = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &is_speech) in flags.iter().enumerate() {
        if is_speech {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            intervals.push(SpeechInterval {
                start: s as f64 * frame_duration,
                end: i as f64 * frame_duration,
            });
        }
    }

    if let Some(s) = start {
        intervals.push(SpeechInterval {
            start: s as f64 * frame_duration,
            end: flags.len() as f64 * frame_duration,
        });
    }

    intervals
}
