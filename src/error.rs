//! Error types for pose classification and repetition counting.

use thiserror::Error;

use crate::pose::LandmarkIndex;

/// Per-frame failure to build a feature vector. Recoverable: the frame is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    /// Detector found nobody in this frame.
    #[error("no pose detected")]
    NoPose,

    /// Landmark set does not follow the 33-point topology.
    #[error("expected {expected} landmarks, got {actual}")]
    LandmarkCount {
        /// Required landmark count.
        expected: usize,
        /// Count actually received.
        actual: usize,
    },

    /// A required landmark is below the visibility threshold.
    #[error("landmark {landmark:?} not visible enough: {visibility:.2} < {threshold:.2}")]
    LowVisibility {
        /// Which landmark.
        landmark: LandmarkIndex,
        /// Reported visibility.
        visibility: f32,
        /// Configured minimum.
        threshold: f32,
    },

    /// All landmarks collapse onto the hip center.
    #[error("degenerate pose: body size {0}")]
    DegeneratePose(f32),
}

/// Construction-time configuration error. Prevents the pipeline from starting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Reference library holds no samples.
    #[error("pose library is empty")]
    EmptyLibrary,

    /// Neighbor count must be positive.
    #[error("invalid neighbor count k={0}")]
    InvalidK(usize),

    /// EMA alpha outside (0, 1].
    #[error("invalid EMA alpha {0}, expected (0, 1]")]
    InvalidAlpha(f32),

    /// Hysteresis band is empty or inverted.
    #[error("invalid thresholds: enter {enter} must exceed exit {exit}")]
    InvalidThresholds {
        /// Enter threshold.
        enter: f32,
        /// Exit threshold.
        exit: f32,
    },

    /// An exercise watches a label the library never mentions.
    #[error("label {0:?} is not present in the pose library")]
    UnknownLabel(String),

    /// Samples or queries disagree on embedding length.
    #[error("inconsistent embedding length: expected {expected}, got {actual}")]
    InconsistentDimension {
        /// Length of the first sample.
        expected: usize,
        /// Offending length.
        actual: usize,
    },

    /// No exercises configured.
    #[error("no exercises configured")]
    NoExercises,
}

/// Failure to read reference samples.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Underlying reader failed.
    #[error("failed to read samples: {0}")]
    Io(#[from] std::io::Error),

    /// A coordinate could not be parsed as a number.
    #[error("line {line}: invalid number {value:?}")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        value: String,
    },

    /// A sample could not be embedded.
    #[error("line {line}: {source}")]
    Embedding {
        /// 1-based line number.
        line: usize,
        /// Embedding failure.
        source: EmbeddingError,
    },
}
