use serde::Deserialize;

use crate::classify::ClassConfidence;

/// Smoothed per-label confidence, same shape as a raw reading
pub type SmoothedConfidence = ClassConfidence;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SmoothConfig {
    /// Weight of the newest reading, (0, 1]
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

fn default_alpha() -> f32 { 0.2 }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self { alpha: default_alpha() }
    }
}

/// EMA over per-label classification confidence.
///
/// `smoothed = alpha * raw + (1 - alpha) * prev`, with `prev` starting at 0.
/// A label already tracked but missing from a reading decays as if it read 0.
pub struct EmaSmoother {
    alpha: f32,
    smoothed: SmoothedConfidence,
}

impl EmaSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            smoothed: SmoothedConfidence::new(),
        }
    }

    pub fn from_config(config: &SmoothConfig) -> Self {
        Self::new(config.alpha)
    }

    pub fn update(&mut self, raw: &ClassConfidence) -> &SmoothedConfidence {
        let a = self.alpha;

        let tracked: Vec<(String, f32)> = self
            .smoothed
            .iter()
            .filter(|(label, _)| !raw.contains(label))
            .map(|(label, prev)| (label.to_string(), prev))
            .collect();
        for (label, prev) in tracked {
            self.smoothed.set(&label, (1.0 - a) * prev);
        }

        for (label, value) in raw.iter() {
            let prev = self.smoothed.get(label);
            self.smoothed.set(label, a * value + (1.0 - a) * prev);
        }

        &self.smoothed
    }

    pub fn current(&self) -> &SmoothedConfidence {
        &self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = SmoothedConfidence::new();
    }
}
