// Scalar amplitude features
// A cheap stand-in for voice embeddings: mean absolute amplitude of a clip

use anyhow::Result;
use std::path::Path;

use super::{DistanceMetric, FeatureExtractor};
use crate::audio;

/// Mean-absolute-amplitude heuristic (length-1 feature vectors)
pub struct AmplitudeFeatures {
    acceptance_threshold: f32,
    suggestion_threshold: f32,
}

impl AmplitudeFeatures {
    pub fn new(acceptance_threshold: f32, suggestion_threshold: f32) -> Self {
        Self {
            acceptance_threshold,
            suggestion_threshold,
        }
    }
}

impl Default for AmplitudeFeatures {
    fn default() -> Self {
        // Scalar features need a wider acceptance tolerance than cosine
        // distance on embeddings
        Self::new(0.15, 0.1)
    }
}

impl FeatureExtractor for AmplitudeFeatures {
    fn extract(&self, clip: &Path) -> Result<Vec<f32>> {
        let buffer = audio::load_wav(clip)?;
        if buffer.samples.is_empty() {
            return Ok(vec![0.0]);
        }
        let mean_abs =
            buffer.samples.iter().map(|s| s.abs()).sum::<f32>() / buffer.samples.len() as f32;
        Ok(vec![mean_abs])
    }

    fn metric(&self) -> DistanceMetric {
        DistanceMetric::Absolute
    }

    fn acceptance_threshold(&self) -> f32 {
        self.acceptance_threshold
    }

    fn suggestion_threshold(&self) -> f32 {
        self.suggestion_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_extract_mean_amplitude() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        crate::audio::write_wav(&path, &[0.5f32; 1600], 16000).unwrap();

        let features = AmplitudeFeatures::default().extract(&path).unwrap();
        assert_eq!(features.len(), 1);
        assert!((features[0] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_missing_clip_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.wav");
        assert!(AmplitudeFeatures::default().extract(&missing).is_err());
    }
}
