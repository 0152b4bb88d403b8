use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::landmark::{LandmarkIndex, LandmarkSet};
use crate::error::EmbeddingError;

/// Number of landmark-difference vectors in an embedding
pub const EMBEDDING_PAIRS: usize = 23;
/// Length of a flattened embedding (x, y, z per pair)
pub const EMBEDDING_DIM: usize = EMBEDDING_PAIRS * 3;

/// Normalized landmarks are multiplied by this so distances read as percentages of body size
const OUTPUT_SCALE: f32 = 100.0;

/// Landmarks the embedder cannot work without
const REQUIRED: [LandmarkIndex; 4] = [
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
];

/// Translation- and scale-normalized pose representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EmbedderConfig {
    /// Torso length multiplier used as the lower bound of body size
    #[serde(default = "default_torso_multiplier")]
    pub torso_multiplier: f32,
    /// Minimum visibility for shoulders and hips
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f32,
}

fn default_torso_multiplier() -> f32 { 2.5 }
fn default_min_visibility() -> f32 { 0.5 }

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            torso_multiplier: default_torso_multiplier(),
            min_visibility: default_min_visibility(),
        }
    }
}

/// Converts a landmark set into a [`FeatureVector`].
///
/// Position is removed by centering on the hip midpoint, scale by dividing by
/// the larger of the scaled torso length and the farthest landmark from the
/// center. Both use image-plane (x, y) distances only. The embedding itself is
/// a fixed list of joint-to-joint difference vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseEmbedder {
    config: EmbedderConfig,
}

impl PoseEmbedder {
    pub fn new(config: EmbedderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    /// Embed one detected frame, checking topology and required-landmark visibility
    pub fn embed(&self, landmarks: &LandmarkSet) -> Result<FeatureVector, EmbeddingError> {
        if landmarks.is_empty() {
            return Err(EmbeddingError::NoPose);
        }
        if landmarks.len() != LandmarkIndex::COUNT {
            return Err(EmbeddingError::LandmarkCount {
                expected: LandmarkIndex::COUNT,
                actual: landmarks.len(),
            });
        }
        for index in REQUIRED {
            if let Some(lm) = landmarks.get(index) {
                if !lm.is_visible(self.config.min_visibility) {
                    return Err(EmbeddingError::LowVisibility {
                        landmark: index,
                        visibility: lm.visibility,
                        threshold: self.config.min_visibility,
                    });
                }
            }
        }

        let positions: Vec<Vector3<f32>> = landmarks.landmarks.iter().map(|l| l.position()).collect();
        self.embed_positions(&positions)
    }

    /// Embed raw landmark positions (no visibility data, e.g. reference samples)
    pub fn embed_positions(&self, positions: &[Vector3<f32>]) -> Result<FeatureVector, EmbeddingError> {
        if positions.len() != LandmarkIndex::COUNT {
            return Err(EmbeddingError::LandmarkCount {
                expected: LandmarkIndex::COUNT,
                actual: positions.len(),
            });
        }

        let normalized = self.normalize(positions)?;
        let p = |i: LandmarkIndex| normalized[i as usize];

        use LandmarkIndex::*;
        let pairs: [Vector3<f32>; EMBEDDING_PAIRS] = [
            // one joint
            midpoint(p(LeftHip), p(RightHip)) - midpoint(p(LeftShoulder), p(RightShoulder)),
            p(LeftElbow) - p(LeftShoulder),
            p(RightElbow) - p(RightShoulder),
            p(LeftWrist) - p(LeftElbow),
            p(RightWrist) - p(RightElbow),
            p(LeftKnee) - p(LeftHip),
            p(RightKnee) - p(RightHip),
            p(LeftAnkle) - p(LeftKnee),
            p(RightAnkle) - p(RightKnee),
            // two joints
            p(LeftWrist) - p(LeftShoulder),
            p(RightWrist) - p(RightShoulder),
            p(LeftAnkle) - p(LeftHip),
            p(RightAnkle) - p(RightHip),
            // four joints
            p(LeftWrist) - p(LeftHip),
            p(RightWrist) - p(RightHip),
            // five joints
            p(LeftAnkle) - p(LeftShoulder),
            p(RightAnkle) - p(RightShoulder),
            p(LeftWrist) - p(LeftHip),
            p(RightWrist) - p(RightHip),
            // cross body
            p(RightElbow) - p(LeftElbow),
            p(RightKnee) - p(LeftKnee),
            p(RightWrist) - p(LeftWrist),
            p(RightAnkle) - p(LeftAnkle),
        ];

        let values = pairs.iter().flat_map(|v| [v.x, v.y, v.z]).collect();
        Ok(FeatureVector::new(values))
    }

    fn normalize(&self, positions: &[Vector3<f32>]) -> Result<Vec<Vector3<f32>>, EmbeddingError> {
        let center = midpoint(
            positions[LandmarkIndex::LeftHip as usize],
            positions[LandmarkIndex::RightHip as usize],
        );
        let size = self.pose_size(positions, center);
        if !(size > f32::EPSILON) {
            return Err(EmbeddingError::DegeneratePose(size));
        }

        Ok(positions
            .iter()
            .map(|p| (p - center) / size * OUTPUT_SCALE)
            .collect())
    }

    fn pose_size(&self, positions: &[Vector3<f32>], center: Vector3<f32>) -> f32 {
        let shoulders = midpoint(
            positions[LandmarkIndex::LeftShoulder as usize],
            positions[LandmarkIndex::RightShoulder as usize],
        );
        let torso = planar_distance(shoulders, center);

        let max_dist = positions
            .iter()
            .map(|p| planar_distance(*p, center))
            .fold(0.0f32, f32::max);

        (torso * self.config.torso_multiplier).max(max_dist)
    }
}

fn midpoint(a: Vector3<f32>, b: Vector3<f32>) -> Vector3<f32> {
    (a + b) * 0.5
}

fn planar_distance(a: Vector3<f32>, b: Vector3<f32>) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}
