use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::Vector3;
use ndarray::{Array2, ArrayView1};
use tracing::{debug, warn};

use crate::error::{ConfigError, LibraryError};
use crate::pose::{FeatureVector, LandmarkIndex, PoseEmbedder, EMBEDDING_DIM};

/// Raw-landmark rows carry x, y, z for every landmark
const RAW_COORDS: usize = LandmarkIndex::COUNT * 3;

/// One labeled reference pose
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSample {
    pub name: String,
    pub label: String,
    pub embedding: FeatureVector,
}

impl PoseSample {
    pub fn new(name: impl Into<String>, label: impl Into<String>, embedding: FeatureVector) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            embedding,
        }
    }
}

/// Immutable reference pose library.
///
/// Embeddings are stored row-per-sample in one matrix; row order is the
/// order samples were loaded in and is what the classifier breaks ties by.
#[derive(Debug, Clone)]
pub struct PoseLibrary {
    embeddings: Array2<f32>,
    names: Vec<String>,
    labels: Vec<String>,
    label_order: Vec<String>,
}

impl PoseLibrary {
    pub fn load(samples: Vec<PoseSample>) -> Result<Self, ConfigError> {
        let dim = match samples.first() {
            Some(s) => s.embedding.len(),
            None => return Err(ConfigError::EmptyLibrary),
        };

        let mut values = Vec::with_capacity(samples.len() * dim);
        let mut names = Vec::with_capacity(samples.len());
        let mut labels = Vec::with_capacity(samples.len());
        let mut label_order: Vec<String> = Vec::new();

        for sample in samples {
            if sample.embedding.len() != dim {
                return Err(ConfigError::InconsistentDimension {
                    expected: dim,
                    actual: sample.embedding.len(),
                });
            }
            values.extend_from_slice(sample.embedding.as_slice());
            if !label_order.contains(&sample.label) {
                label_order.push(sample.label.clone());
            }
            names.push(sample.name);
            labels.push(sample.label);
        }

        let embeddings = Array2::from_shape_vec((labels.len(), dim), values)
            .map_err(|_| ConfigError::InconsistentDimension { expected: dim, actual: 0 })?;

        Ok(Self {
            embeddings,
            names,
            labels,
            label_order,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Embedding length shared by every sample
    pub fn dim(&self) -> usize {
        self.embeddings.ncols()
    }

    pub fn embedding(&self, index: usize) -> ArrayView1<'_, f32> {
        self.embeddings.row(index)
    }

    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Distinct labels in first-seen order
    pub fn labels(&self) -> &[String] {
        &self.label_order
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.label_order.iter().any(|l| l == label)
    }

    /// Library narrowed to the given labels, keeping sample order
    pub fn restrict_to(&self, labels: &[&str]) -> Result<Self, ConfigError> {
        let samples = (0..self.len())
            .filter(|&i| labels.contains(&self.label(i)))
            .map(|i| {
                PoseSample::new(
                    self.name(i),
                    self.label(i),
                    FeatureVector::new(self.embedding(i).to_vec()),
                )
            })
            .collect();
        Self::load(samples)
    }

    /// Number of samples per label, in first-seen order
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        self.label_order
            .iter()
            .map(|l| (l.clone(), self.labels.iter().filter(|x| *x == l).count()))
            .collect()
    }
}

/// Parse reference samples from CSV.
///
/// Each row is `name,label,values...` where values are either the raw
/// x/y/z of all 33 landmarks (embedded on the fly) or an already embedded
/// vector. Rows of any other width are skipped.
pub fn read_samples<R: BufRead>(reader: R, embedder: &PoseEmbedder) -> Result<Vec<PoseSample>, LibraryError> {
    let mut samples = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 2 {
            warn!("line {}: missing name or label, skipped", line_no);
            continue;
        }
        let (name, label) = (fields[0], fields[1]);
        let values = fields[2..]
            .iter()
            .map(|v| {
                v.parse::<f32>().map_err(|_| LibraryError::InvalidNumber {
                    line: line_no,
                    value: (*v).to_string(),
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;

        let embedding = match values.len() {
            RAW_COORDS => {
                let positions: Vec<Vector3<f32>> = values
                    .chunks_exact(3)
                    .map(|c| Vector3::new(c[0], c[1], c[2]))
                    .collect();
                embedder
                    .embed_positions(&positions)
                    .map_err(|source| LibraryError::Embedding { line: line_no, source })?
            }
            EMBEDDING_DIM => FeatureVector::new(values),
            n => {
                warn!("line {}: {} values, expected {} or {}, skipped", line_no, n, RAW_COORDS, EMBEDDING_DIM);
                continue;
            }
        };

        samples.push(PoseSample::new(name, label, embedding));
    }

    debug!("read {} pose samples", samples.len());
    Ok(samples)
}

/// Write samples in the embedded row format accepted by [`read_samples`]
pub fn write_samples<W: Write>(mut writer: W, samples: &[PoseSample]) -> std::io::Result<()> {
    for sample in samples {
        write!(writer, "{},{}", sample.name, sample.label)?;
        for v in sample.embedding.as_slice() {
            write!(writer, ",{}", v)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Load a library from a CSV file on disk
pub fn load_library<P: AsRef<Path>>(path: P, embedder: &PoseEmbedder) -> Result<PoseLibrary> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open pose samples {}", path.display()))?;
    let samples = read_samples(std::io::BufReader::new(file), embedder)
        .with_context(|| format!("Failed to parse pose samples {}", path.display()))?;
    let library = PoseLibrary::load(samples)?;
    Ok(library)
}
