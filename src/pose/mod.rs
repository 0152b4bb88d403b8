pub mod embedding;
pub mod landmark;

pub use embedding::{EmbedderConfig, FeatureVector, PoseEmbedder, EMBEDDING_DIM, EMBEDDING_PAIRS};
pub use landmark::{Landmark, LandmarkIndex, LandmarkSet};
