pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod pose;
pub mod tracker;
pub mod worker;

#[cfg(test)]
mod testutil;

pub use error::{ConfigError, EmbeddingError, LibraryError};
pub use pipeline::{assemble, FrameOutcome, PosePipeline};
pub use worker::{FrameWorker, Published};
