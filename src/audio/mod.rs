// Audio file I/O for transcriptd
// WAV decoding to mono f32 samples and clip export

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

/// Decoded audio: mono samples in [-1.0, 1.0] plus the sample rate
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Sample-accurate duration in seconds
    pub fn duration_sec(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Slice out `[start_sec, end_sec)`, clamped to the buffer
    pub fn slice(&self, start_sec: f64, end_sec: f64) -> &[f32] {
        let start = ((start_sec * self.sample_rate as f64) as usize).min(self.samples.len());
        let end = ((end_sec * self.sample_rate as f64) as usize).min(self.samples.len());
        &self.samples[start..end.max(start)]
    }
}

/// Load a WAV file and downmix to mono f32
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open audio file: {:?}", path))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to read samples from {:?}", path))?
                .into_iter()
                .map(|s| s as f32 / max_val)
                .collect()
        }
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read samples from {:?}", path))?,
    };

    let mono = if spec.channels > 1 {
        let channels = spec.channels as usize;
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok(AudioBuffer {
        samples: mono,
        sample_rate: spec.sample_rate,
    })
}

/// Write mono f32 samples as a 16-bit PCM WAV clip
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create clip: {:?}", path))?;

    for &sample in samples {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(value)
            .with_context(|| format!("Failed to write clip: {:?}", path))?;
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize clip: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// 440 Hz sine, handy for round-trip checks
    fn sine_wave(duration_sec: f64, sample_rate: u32, amplitude: f32) -> Vec<f32> {
        let count = (duration_sec * sample_rate as f64) as usize;
        (0..count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_wav_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let samples = sine_wave(0.5, 16000, 0.5);
        write_wav(&path, &samples, 16000).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.sample_rate, 16000);
        assert_eq!(loaded.samples.len(), samples.len());
        assert!((loaded.duration_sec() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_slice_clamps_to_bounds() {
        let buffer = AudioBuffer {
            samples: vec![0.0; 16000],
            sample_rate: 16000,
        };
        assert_eq!(buffer.slice(0.5, 0.75).len(), 4000);
        assert_eq!(buffer.slice(0.9, 5.0).len(), 1600);
        assert!(buffer.slice(5.0, 6.0).is_empty());
    }
}
