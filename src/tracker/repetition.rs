use serde::Deserialize;
use tracing::{debug, info};

use super::smooth::SmoothedConfidence;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RepetitionConfig {
    /// Smoothed confidence needed to enter a pose
    #[serde(default = "default_enter_threshold")]
    pub enter_threshold: f32,
    /// Smoothed confidence the down pose must fall to before a rep completes
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: f32,
}

fn default_enter_threshold() -> f32 { 0.6 }
fn default_exit_threshold() -> f32 { 0.4 }

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            enter_threshold: default_enter_threshold(),
            exit_threshold: default_exit_threshold(),
        }
    }
}

/// Whether the down pose was most recently confidently observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing observed yet
    Unset,
    /// In the down pose, waiting for the up pose
    Entered,
    /// Out of the down pose
    Exited,
}

/// Counts down→up cycles of one exercise with a hysteresis band.
///
/// Enters the down phase once `smoothed[down] >= enter`. Completes a rep when,
/// while entered, `smoothed[up] >= enter` and `smoothed[down] <= exit`.
/// The count never decreases.
#[derive(Debug, Clone)]
pub struct RepetitionCounter {
    down_label: String,
    up_label: String,
    enter_threshold: f32,
    exit_threshold: f32,
    count: u32,
    phase: Phase,
}

impl RepetitionCounter {
    pub fn new(down_label: impl Into<String>, up_label: impl Into<String>, config: &RepetitionConfig) -> Self {
        Self {
            down_label: down_label.into(),
            up_label: up_label.into(),
            enter_threshold: config.enter_threshold,
            exit_threshold: config.exit_threshold,
            count: 0,
            phase: Phase::Unset,
        }
    }

    pub fn down_label(&self) -> &str {
        &self.down_label
    }

    pub fn up_label(&self) -> &str {
        &self.up_label
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Advance on one frame of smoothed confidence; returns the count afterwards
    pub fn update(&mut self, smoothed: &SmoothedConfidence) -> u32 {
        let down = smoothed.get(&self.down_label);
        let up = smoothed.get(&self.up_label);

        match self.phase {
            Phase::Entered => {
                if up >= self.enter_threshold && down <= self.exit_threshold {
                    self.count = self.count.saturating_add(1);
                    self.phase = Phase::Exited;
                    info!("{} rep {} (down {:.2}, up {:.2})", self.down_label, self.count, down, up);
                }
            }
            Phase::Unset | Phase::Exited => {
                if down >= self.enter_threshold {
                    self.phase = Phase::Entered;
                    debug!("{} entered (down {:.2})", self.down_label, down);
                } else {
                    self.phase = Phase::Exited;
                }
            }
        }

        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.phase = Phase::Unset;
    }
}
