// Clustering engine for transcriptd
// Iterative-relocation (k-means) grouping of one recording's segment
// feature vectors into local speaker clusters

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::features::{euclidean_distance, mean_vector};

/// Maximum relocation iterations before giving up on convergence
const MAX_ITERATIONS: usize = 20;

/// A centroid move below this is treated as converged
const CONVERGENCE_EPSILON: f32 = 1e-3;

/// Per-point labels plus one centroid per cluster
#[derive(Debug, Clone)]
pub struct Clustering {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
}

impl Clustering {
    /// Indices of the points assigned to `cluster`
    pub fn members_of(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Cluster feature vectors with k-means over Euclidean distance.
///
/// `k` is clamped to the number of distinct vectors; fewer than two
/// distinct values yields one trivial cluster. Initial centroids are
/// sampled without replacement from the distinct vectors with a seeded
/// RNG, so repeated runs over the same input produce stable groupings.
pub fn kmeans(data: &[Vec<f32>], k: usize, seed: u64) -> Clustering {
    if data.is_empty() {
        return Clustering {
            labels: Vec::new(),
            centroids: Vec::new(),
        };
    }

    let distinct = distinct_vectors(data);
    let k = k.min(distinct.len());
    if k <= 1 {
        return Clustering {
            labels: vec![0; data.len()],
            centroids: vec![mean_vector(data)],
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids: Vec<Vec<f32>> = distinct
        .choose_multiple(&mut rng, k)
        .cloned()
        .collect();

    for iteration in 0..MAX_ITERATIONS {
        // Assign every point to its nearest centroid, ties to the lowest index
        let labels: Vec<usize> = data.iter().map(|v| nearest(v, &centroids)).collect();

        // Recompute centroids; a centroid with an empty group stays put
        let mut moved = 0.0f32;
        let mut next_centroids = centroids.clone();
        for (c, next) in next_centroids.iter_mut().enumerate() {
            let members: Vec<Vec<f32>> = data
                .iter()
                .zip(labels.iter())
                .filter(|(_, &l)| l == c)
                .map(|(v, _)| v.clone())
                .collect();
            if members.is_empty() {
                continue;
            }
            let mean = mean_vector(&members);
            moved = moved.max(max_component_shift(next, &mean));
            *next = mean;
        }

        centroids = next_centroids;
        if moved <= CONVERGENCE_EPSILON {
            debug!("k-means converged after {} iterations", iteration + 1);
            break;
        }
    }

    // Final labels from one more nearest-centroid pass
    let labels: Vec<usize> = data.iter().map(|v| nearest(v, &centroids)).collect();
    Clustering { labels, centroids }
}

fn nearest(v: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = euclidean_distance(v, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn max_component_shift(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

/// Exact-value deduplication; float bit patterns decide distinctness
fn distinct_vectors(data: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let mut distinct: Vec<Vec<f32>> = Vec::new();
    for v in data {
        if !distinct.iter().any(|d| vectors_equal(d, v)) {
            distinct.push(v.clone());
        }
    }
    distinct
}

fn vectors_equal(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.to_bits() == y.to_bits())
}
