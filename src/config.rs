use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::classify::ClassifierConfig;
use crate::error::ConfigError;
use crate::pose::EmbedderConfig;
use crate::tracker::{default_exercises, ExerciseConfig, RepetitionConfig, SmoothConfig};

/// Top-level `config.toml`. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub repetition: RepetitionConfig,
    /// Tracked exercises in declaration order
    #[serde(default = "default_exercises")]
    pub exercises: Vec<ExerciseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// Reference pose CSV
    #[serde(default = "default_samples_path")]
    pub samples_path: String,
    /// Compare only against labels of the tracked exercises
    #[serde(default)]
    pub restrict_to_exercises: bool,
}

fn default_samples_path() -> String { "pose_samples.csv".to_string() }

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            samples_path: default_samples_path(),
            restrict_to_exercises: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            library: LibraryConfig::default(),
            embedder: EmbedderConfig::default(),
            classifier: ClassifierConfig::default(),
            smooth: SmoothConfig::default(),
            repetition: RepetitionConfig::default(),
            exercises: default_exercises(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Missing or unreadable file falls back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}, using default config", e);
                Self::default()
            }
        }
    }

    /// Checks that do not need the pose library
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.classifier.k == 0 {
            return Err(ConfigError::InvalidK(self.classifier.k));
        }
        let alpha = self.smooth.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }
        let RepetitionConfig { enter_threshold: enter, exit_threshold: exit } = self.repetition;
        if !(enter > exit) || !(0.0..=1.0).contains(&enter) || !(0.0..=1.0).contains(&exit) {
            return Err(ConfigError::InvalidThresholds { enter, exit });
        }
        if self.exercises.is_empty() {
            return Err(ConfigError::NoExercises);
        }
        Ok(())
    }
}
