use std::sync::Arc;

use ndarray::ArrayView1;
use serde::Deserialize;

use super::result::ClassConfidence;
use super::sample::PoseLibrary;
use crate::error::ConfigError;
use crate::pose::FeatureVector;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ClassifierConfig {
    /// Neighbors that vote
    #[serde(default = "default_k")]
    pub k: usize,
    /// Per-axis weights applied to every (x, y, z) triple; depth is least reliable
    #[serde(default = "default_axis_weights")]
    pub axis_weights: [f32; 3],
    /// Keep only this many samples by max per-coordinate difference before the vote
    #[serde(default)]
    pub max_distance_prefilter: Option<usize>,
}

fn default_k() -> usize { 10 }
fn default_axis_weights() -> [f32; 3] { [1.0, 1.0, 0.2] }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            axis_weights: default_axis_weights(),
            max_distance_prefilter: None,
        }
    }
}

/// A library sample chosen as a neighbor of the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// k-nearest-neighbor vote over the reference library
#[derive(Debug, Clone)]
pub struct PoseClassifier {
    library: Arc<PoseLibrary>,
    config: ClassifierConfig,
}

impl PoseClassifier {
    pub fn new(library: Arc<PoseLibrary>, config: ClassifierConfig) -> Result<Self, ConfigError> {
        if library.is_empty() {
            return Err(ConfigError::EmptyLibrary);
        }
        if config.k == 0 {
            return Err(ConfigError::InvalidK(config.k));
        }
        Ok(Self { library, config })
    }

    pub fn library(&self) -> &PoseLibrary {
        &self.library
    }

    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Confidence per library label: share of the k neighbors carrying it
    pub fn classify(&self, vector: &FeatureVector) -> ClassConfidence {
        let neighbors = self.neighbors(vector);

        let labels = self.library.labels();
        let mut votes = vec![0usize; labels.len()];
        for n in &neighbors {
            let label = self.library.label(n.index);
            if let Some(slot) = labels.iter().position(|l| l == label) {
                votes[slot] += 1;
            }
        }

        ClassConfidence::from_votes(
            labels.iter().map(String::as_str).zip(votes),
            self.config.k,
        )
    }

    /// The k closest samples, nearest first. Equal distances keep library order.
    pub fn neighbors(&self, vector: &FeatureVector) -> Vec<Neighbor> {
        let query = vector.as_slice();
        debug_assert_eq!(query.len(), self.library.dim());

        let candidates: Vec<usize> = match self.config.max_distance_prefilter {
            Some(n) => {
                let mut kept: Vec<usize> = smallest(
                    (0..self.library.len()).map(|i| (i, self.max_distance(query, self.library.embedding(i)))),
                    n.max(self.config.k),
                )
                .into_iter()
                .map(|n| n.index)
                .collect();
                // back to library order so ties keep first-seen precedence
                kept.sort_unstable();
                kept
            }
            None => (0..self.library.len()).collect(),
        };

        smallest(
            candidates
                .into_iter()
                .map(|i| (i, self.distance(query, self.library.embedding(i)))),
            self.config.k,
        )
    }

    /// Weighted Euclidean distance
    fn distance(&self, query: &[f32], sample: ArrayView1<'_, f32>) -> f32 {
        query
            .iter()
            .zip(sample.iter())
            .enumerate()
            .map(|(j, (q, s))| {
                let d = (q - s) * self.config.axis_weights[j % 3];
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }

    /// Largest weighted per-coordinate difference
    fn max_distance(&self, query: &[f32], sample: ArrayView1<'_, f32>) -> f32 {
        query
            .iter()
            .zip(sample.iter())
            .enumerate()
            .map(|(j, (q, s))| ((q - s) * self.config.axis_weights[j % 3]).abs())
            .fold(0.0f32, f32::max)
    }
}

/// Keep the `k` smallest distances in one pass (O(n·k)), stable on ties
fn smallest<I>(distances: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut best: Vec<Neighbor> = Vec::with_capacity(k + 1);
    for (index, distance) in distances {
        let pos = best.iter().position(|n| n.distance > distance).unwrap_or(best.len());
        if pos < k {
            best.insert(pos, Neighbor { index, distance });
            best.truncate(k);
        }
    }
    best
}
