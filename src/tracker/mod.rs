pub mod exercise;
pub mod repetition;
pub mod smooth;

pub use exercise::{default_exercises, parse_rep_suffix, ExerciseConfig, ExerciseKind, ExerciseResult};
pub use repetition::{Phase, RepetitionConfig, RepetitionCounter};
pub use smooth::{EmaSmoother, SmoothConfig, SmoothedConfidence};
