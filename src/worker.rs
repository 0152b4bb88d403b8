//! Runs a [`PosePipeline`] on its own thread.
//!
//! Frames are handed over through a one-slot queue: if the worker is still
//! busy, new frames are dropped rather than buffered. Each processed frame
//! replaces the previously published result. A session restart bumps a
//! generation counter; work submitted or finished under an older generation
//! is discarded instead of touching the new session's state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::pipeline::PosePipeline;
use crate::pose::LandmarkSet;
use crate::tracker::ExerciseResult;

const QUEUE_DEPTH: usize = 1;

/// Latest result handed to the presentation side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Published {
    /// Id of the last frame processed in this generation (0 = none yet)
    pub frame_id: u64,
    pub generation: u64,
    pub results: Vec<ExerciseResult>,
}

struct Job {
    frame_id: u64,
    generation: u64,
    landmarks: LandmarkSet,
}

struct Shared {
    generation: AtomicU64,
    dropped: AtomicU64,
    latest: Mutex<Published>,
    updated: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            latest: Mutex::new(Published::default()),
            updated: Condvar::new(),
        }
    }

    fn latest(&self) -> MutexGuard<'_, Published> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bump the generation and clear the published slot under one lock
    fn restart(&self) -> u64 {
        let mut latest = self.latest();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        *latest = Published {
            frame_id: 0,
            generation,
            results: Vec::new(),
        };
        self.updated.notify_all();
        generation
    }

    /// Publish a finished frame unless its session has been restarted meanwhile
    fn publish(&self, frame_id: u64, generation: u64, results: Vec<ExerciseResult>) -> bool {
        let mut latest = self.latest();
        if latest.generation != generation {
            return false;
        }
        *latest = Published {
            frame_id,
            generation,
            results,
        };
        self.updated.notify_all();
        true
    }
}

pub struct FrameWorker {
    tx: Option<mpsc::SyncSender<Job>>,
    shared: Arc<Shared>,
    next_frame_id: AtomicU64,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameWorker {
    /// Move `pipeline` onto a new worker thread
    pub fn start(pipeline: PosePipeline) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<Job>(QUEUE_DEPTH);
        let shared = Arc::new(Shared::new());
        let shared_ref = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name("pose-pipeline".to_string())
            .spawn(move || run(pipeline, rx, shared_ref))
            .context("Failed to spawn pipeline worker")?;

        Ok(Self {
            tx: Some(tx),
            shared,
            next_frame_id: AtomicU64::new(1),
            handle: Some(handle),
        })
    }

    /// Hand a frame to the worker without blocking.
    ///
    /// Returns the frame id if accepted, `None` if it was dropped because the
    /// worker is busy or gone.
    pub fn submit(&self, landmarks: LandmarkSet) -> Option<u64> {
        let tx = self.tx.as_ref()?;
        let frame_id = self.next_frame_id.fetch_add(1, Ordering::Relaxed);
        let job = Job {
            frame_id,
            generation: self.shared.generation.load(Ordering::Acquire),
            landmarks,
        };
        match tx.try_send(job) {
            Ok(()) => Some(frame_id),
            Err(TrySendError::Full(_)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(TrySendError::Disconnected(_)) => None,
        }
    }

    pub fn latest(&self) -> Published {
        self.shared.latest().clone()
    }

    /// Block until `frame_id` (or a later frame) is published, or `timeout` passes
    pub fn wait_for(&self, frame_id: u64, timeout: Duration) -> Option<Published> {
        let deadline = Instant::now() + timeout;
        let mut latest = self.shared.latest();
        while latest.frame_id < frame_id {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, _) = self
                .shared
                .updated
                .wait_timeout(latest, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            latest = guard;
        }
        Some(latest.clone())
    }

    /// Frames rejected because the worker was busy
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    /// End the current session and start a fresh one.
    ///
    /// Published results are cleared immediately; the worker resets its
    /// pipeline before the next frame of the new generation.
    pub fn restart_session(&self) -> u64 {
        let generation = self.shared.restart();
        info!("session restarted (generation {})", generation);
        generation
    }

    /// Stop accepting frames and join the worker thread
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(mut pipeline: PosePipeline, rx: mpsc::Receiver<Job>, shared: Arc<Shared>) {
    let mut active_generation = shared.generation.load(Ordering::Acquire);

    for job in rx {
        let current = shared.generation.load(Ordering::Acquire);
        if job.generation != current {
            debug!("frame {} from generation {} discarded", job.frame_id, job.generation);
            continue;
        }
        if active_generation != current {
            pipeline.reset();
            active_generation = current;
        }

        let results = pipeline.process(&job.landmarks).to_vec();

        if !shared.publish(job.frame_id, job.generation, results) {
            // session restarted mid-frame
            debug!("frame {} finished after restart, result discarded", job.frame_id);
        }
    }

    debug!("pipeline worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{PoseLibrary, PoseSample};
    use crate::config::Config;
    use crate::pose::PoseEmbedder;
    use crate::testutil::squat_pose;
    use crate::tracker::{ExerciseConfig, ExerciseKind};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn pipeline() -> PosePipeline {
        let embedder = PoseEmbedder::default();
        let mut samples = Vec::new();
        for i in 0..3 {
            let up = squat_pose(i as f32 * 0.05);
            let down = squat_pose(1.0 - i as f32 * 0.05);
            samples.push(PoseSample::new("up", "squats_up", embedder.embed(&up).unwrap()));
            samples.push(PoseSample::new("down", "squats_down", embedder.embed(&down).unwrap()));
        }
        let mut config = Config::default();
        config.classifier.k = 3;
        config.smooth.alpha = 1.0;
        config.exercises = vec![ExerciseConfig::with_default_labels(ExerciseKind::Squats)];
        PosePipeline::new(Arc::new(PoseLibrary::load(samples).unwrap()), &config).unwrap()
    }

    fn submit_and_wait(worker: &FrameWorker, landmarks: LandmarkSet) -> Published {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            if let Some(id) = worker.submit(landmarks.clone()) {
                return worker.wait_for(id, TIMEOUT).expect("frame not published");
            }
            assert!(Instant::now() < deadline, "worker never accepted frame");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_publishes_counts() {
        let worker = FrameWorker::start(pipeline()).unwrap();
        assert!(worker.latest().results.is_empty());

        submit_and_wait(&worker, squat_pose(1.0));
        let published = submit_and_wait(&worker, squat_pose(0.0));
        assert_eq!(published.results[0].kind, ExerciseKind::Squats);
        assert_eq!(published.results[0].reps, 1);
        worker.stop();
    }

    #[test]
    fn test_empty_frame_keeps_published_results() {
        let worker = FrameWorker::start(pipeline()).unwrap();
        submit_and_wait(&worker, squat_pose(1.0));
        let before = submit_and_wait(&worker, squat_pose(0.0));
        let after = submit_and_wait(&worker, LandmarkSet::empty());
        assert_eq!(after.results, before.results);
        assert!(after.frame_id > before.frame_id);
    }

    #[test]
    fn test_restart_session_discards_state() {
        let worker = FrameWorker::start(pipeline()).unwrap();
        submit_and_wait(&worker, squat_pose(1.0));
        submit_and_wait(&worker, squat_pose(0.0));

        let generation = worker.restart_session();
        assert_eq!(worker.generation(), generation);
        let cleared = worker.latest();
        assert!(cleared.results.is_empty());
        assert_eq!(cleared.generation, generation);

        let published = submit_and_wait(&worker, squat_pose(0.0));
        assert_eq!(published.generation, generation);
        assert_eq!(published.results[0].reps, 0);
    }

    #[test]
    fn test_submit_never_blocks() {
        let worker = FrameWorker::start(pipeline()).unwrap();
        let total = 200;
        let accepted = (0..total).filter(|_| worker.submit(squat_pose(0.5)).is_some()).count();
        assert_eq!(accepted as u64 + worker.dropped(), total as u64);
        assert!(accepted >= 1);
    }

    #[test]
    fn test_result_finished_after_restart_is_discarded() {
        let shared = Shared::new();
        let mut pipeline = pipeline();
        let results = pipeline.process(&squat_pose(1.0)).to_vec();
        assert!(!results.is_empty());

        // frame of generation 0 still computing when the session restarts
        let generation = shared.restart();
        assert!(!shared.publish(1, 0, results.clone()));
        let latest = shared.latest().clone();
        assert_eq!(latest, Published { frame_id: 0, generation, results: Vec::new() });

        assert!(shared.publish(2, generation, results.clone()));
        assert_eq!(shared.latest().frame_id, 2);
    }

    #[test]
    fn test_stale_generation_job_is_skipped() {
        let shared = Arc::new(Shared::new());
        let (tx, rx) = mpsc::sync_channel::<Job>(2);
        tx.send(Job { frame_id: 1, generation: 0, landmarks: squat_pose(1.0) }).unwrap();
        let generation = shared.restart();
        tx.send(Job { frame_id: 2, generation, landmarks: squat_pose(0.0) }).unwrap();
        drop(tx);

        run(pipeline(), rx, Arc::clone(&shared));

        let latest = shared.latest().clone();
        assert_eq!(latest.frame_id, 2);
        assert_eq!(latest.generation, generation);
        // the down frame never reached the new session, so no rep was counted
        assert_eq!(latest.results[0].reps, 0);
    }

    #[test]
    fn test_restart_while_frame_in_flight() {
        let worker = FrameWorker::start(pipeline()).unwrap();
        let deadline = Instant::now() + TIMEOUT;
        while worker.submit(squat_pose(1.0)).is_none() {
            assert!(Instant::now() < deadline, "worker never accepted frame");
            thread::sleep(Duration::from_millis(1));
        }
        let generation = worker.restart_session();

        let expected = Published { frame_id: 0, generation, results: Vec::new() };
        assert_eq!(worker.latest(), expected);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(worker.latest(), expected);
        worker.stop();
    }

    #[test]
    fn test_wait_for_times_out() {
        let worker = FrameWorker::start(pipeline()).unwrap();
        assert!(worker.wait_for(99, Duration::from_millis(20)).is_none());
    }
}
