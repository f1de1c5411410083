// Voice feature extraction for transcriptd
// One strategy trait over the scalar amplitude heuristic and full
// voice embeddings; distances for clustering and identity matching

mod amplitude;
mod remote;

use anyhow::Result;
use std::path::Path;

pub use amplitude::AmplitudeFeatures;
pub use remote::RemoteEmbeddingExtractor;

/// Distance used when comparing representatives for identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Cosine distance `1 - cos(a, b)`, for embedding vectors
    Cosine,
    /// Absolute difference of scalars (length-1 vectors)
    Absolute,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_distance(a, b),
            DistanceMetric::Absolute => {
                let a0 = a.first().copied().unwrap_or(0.0);
                let b0 = b.first().copied().unwrap_or(0.0);
                (a0 - b0).abs()
            }
        }
    }
}

/// Extracts a fixed-length feature vector from an exported clip.
/// Scalar features are length-1 vectors.
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, clip: &Path) -> Result<Vec<f32>>;

    /// Metric used for representative comparisons
    fn metric(&self) -> DistanceMetric;

    /// An unmatched cluster beyond this distance becomes a new identity
    fn acceptance_threshold(&self) -> f32;

    /// Bound for `reassign_segment` similarity suggestions
    fn suggestion_threshold(&self) -> f32;
}

/// Cosine distance between two vectors (0 = identical direction)
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    1.0 - dot / (norm_a * norm_b + 1e-10)
}

/// Euclidean distance, used by the clustering engine
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Componentwise mean of a set of equal-length vectors
pub fn mean_vector(vectors: &[Vec<f32>]) -> Vec<f32> {
    if vectors.is_empty() {
        return Vec::new();
    }
    let dim = vectors[0].len();
    let mut mean = vec![0.0f32; dim];
    for v in vectors {
        for (m, x) in mean.iter_mut().zip(v.iter()) {
            *m += x;
        }
    }
    for m in mean.iter_mut() {
        *m /= vectors.len() as f32;
    }
    mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        let a = vec![1.0, 0.0, 0.0];
        assert!(cosine_distance(&a, &a).abs() < 0.001);

        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![-1.0, 0.0, 0.0];
        assert!((cosine_distance(&a, &c) - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_absolute_metric_on_scalars() {
        let metric = DistanceMetric::Absolute;
        assert!((metric.distance(&[0.3], &[0.1]) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_mean_vector() {
        let mean = mean_vector(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(mean, vec![2.0, 3.0]);
        assert!(mean_vector(&[]).is_empty());
    }
}
