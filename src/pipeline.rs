//! Per-session processing: landmarks → embedding → kNN → EMA → rep counters → ranked results.

use std::sync::Arc;

use tracing::{debug, info};

use crate::classify::{ClassConfidence, PoseClassifier, PoseLibrary};
use crate::config::Config;
use crate::error::ConfigError;
use crate::pose::{LandmarkSet, PoseEmbedder, EMBEDDING_DIM};
use crate::tracker::{EmaSmoother, ExerciseKind, ExerciseResult, RepetitionCounter, SmoothedConfidence};

/// A repetition counter bound to the exercise it counts
#[derive(Debug, Clone)]
pub struct ExerciseCounter {
    pub kind: ExerciseKind,
    pub counter: RepetitionCounter,
}

/// Rank exercises by combined smoothed confidence of their two labels.
///
/// Exercises with no confidence at all are left out. Ties keep the order
/// `counters` is given in.
pub fn assemble(smoothed: &SmoothedConfidence, counters: &[ExerciseCounter]) -> Vec<ExerciseResult> {
    let mut results: Vec<ExerciseResult> = counters
        .iter()
        .map(|c| ExerciseResult {
            kind: c.kind,
            reps: c.counter.count(),
            confidence: smoothed.get(c.counter.down_label()) + smoothed.get(c.counter.up_label()),
        })
        .filter(|r| r.confidence > 0.0)
        .collect();
    results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    results
}

/// What one frame did to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Frame was classified and state advanced
    Classified(ClassConfidence),
    /// No usable pose; state untouched
    Skipped,
}

/// Classification and counting state for one detection session.
///
/// Create one per camera or video activation; [`PosePipeline::reset`] (or a
/// new instance) starts a fresh session with zero counts.
pub struct PosePipeline {
    embedder: PoseEmbedder,
    classifier: PoseClassifier,
    smoother: EmaSmoother,
    counters: Vec<ExerciseCounter>,
    results: Vec<ExerciseResult>,
    classified_frames: u64,
    skipped_frames: u64,
}

impl PosePipeline {
    pub fn new(library: Arc<PoseLibrary>, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        if library.is_empty() {
            return Err(ConfigError::EmptyLibrary);
        }
        if library.dim() != EMBEDDING_DIM {
            return Err(ConfigError::InconsistentDimension {
                expected: EMBEDDING_DIM,
                actual: library.dim(),
            });
        }
        for exercise in &config.exercises {
            for label in [&exercise.down_label, &exercise.up_label] {
                if !library.contains_label(label) {
                    return Err(ConfigError::UnknownLabel(label.clone()));
                }
            }
        }

        let library = if config.library.restrict_to_exercises {
            let labels: Vec<&str> = config
                .exercises
                .iter()
                .flat_map(|e| [e.down_label.as_str(), e.up_label.as_str()])
                .collect();
            Arc::new(library.restrict_to(&labels)?)
        } else {
            library
        };

        let counters = config
            .exercises
            .iter()
            .map(|e| ExerciseCounter {
                kind: e.kind,
                counter: RepetitionCounter::new(&e.down_label, &e.up_label, &config.repetition),
            })
            .collect();

        info!(
            "pipeline ready: {} samples, {} labels, k={}, alpha={}",
            library.len(),
            library.labels().len(),
            config.classifier.k,
            config.smooth.alpha
        );

        Ok(Self {
            embedder: PoseEmbedder::new(config.embedder),
            classifier: PoseClassifier::new(library, config.classifier)?,
            smoother: EmaSmoother::from_config(&config.smooth),
            counters,
            results: Vec::new(),
            classified_frames: 0,
            skipped_frames: 0,
        })
    }

    /// Process one frame and return the current ranked results.
    ///
    /// Frames without a usable pose leave every piece of state, including the
    /// previously returned results, unchanged.
    pub fn process(&mut self, landmarks: &LandmarkSet) -> &[ExerciseResult] {
        self.process_frame(landmarks);
        &self.results
    }

    pub fn process_frame(&mut self, landmarks: &LandmarkSet) -> FrameOutcome {
        let vector = match self.embedder.embed(landmarks) {
            Ok(v) => v,
            Err(e) => {
                self.skipped_frames += 1;
                debug!("frame skipped: {}", e);
                return FrameOutcome::Skipped;
            }
        };

        let raw = self.classifier.classify(&vector);
        let smoothed = self.smoother.update(&raw);
        for c in &mut self.counters {
            c.counter.update(smoothed);
        }
        self.results = assemble(smoothed, &self.counters);
        self.classified_frames += 1;

        FrameOutcome::Classified(raw)
    }

    /// Latest ranked results; empty until a frame has been classified
    pub fn results(&self) -> &[ExerciseResult] {
        &self.results
    }

    /// Display tokens of the latest results, e.g. `["squats_8", "pushups_2"]`
    pub fn tokens(&self) -> Vec<String> {
        self.results.iter().map(ExerciseResult::token).collect()
    }

    pub fn smoothed(&self) -> &SmoothedConfidence {
        self.smoother.current()
    }

    pub fn counters(&self) -> &[ExerciseCounter] {
        &self.counters
    }

    /// Repetitions counted so far for `kind`
    pub fn reps(&self, kind: ExerciseKind) -> Option<u32> {
        self.counters.iter().find(|c| c.kind == kind).map(|c| c.counter.count())
    }

    pub fn classified_frames(&self) -> u64 {
        self.classified_frames
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    /// Start a new session: clears smoothing, counts and results
    pub fn reset(&mut self) {
        self.smoother.reset();
        for c in &mut self.counters {
            c.counter.reset();
        }
        self.results.clear();
        self.classified_frames = 0;
        self.skipped_frames = 0;
        info!("session reset");
    }
}
