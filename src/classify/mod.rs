pub mod knn;
pub mod result;
pub mod sample;

pub use knn::{ClassifierConfig, Neighbor, PoseClassifier};
pub use result::ClassConfidence;
pub use sample::{load_library, read_samples, write_samples, PoseLibrary, PoseSample};
