//! Replays a recorded landmark stream through the classifier and prints
//! exercise labels as they change.
//!
//! The stream file holds one JSON `LandmarkSet` per line; a blank line or an
//! empty `landmarks` array stands for a frame with no detected pose.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rep_tracker::classify::load_library;
use rep_tracker::config::Config;
use rep_tracker::pose::{LandmarkSet, PoseEmbedder};
use rep_tracker::tracker::ExerciseResult;
use rep_tracker::{FrameWorker, PosePipeline};

const CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "rep-tracker", version = env!("GIT_VERSION"), about = "Count exercise repetitions from pose landmarks")]
struct Args {
    /// Landmark stream, one JSON landmark set per line
    stream: PathBuf,

    /// Config file
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override the reference sample CSV from the config
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Feed frames to a background worker at this rate, dropping frames it cannot keep up with
    #[arg(long)]
    fps: Option<f32>,

    /// Print the final results as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    frames: usize,
    results: &'a [ExerciseResult],
    tokens: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    info!("rep-tracker {}", env!("GIT_VERSION"));

    let config = Config::load_or_default(&args.config);
    let samples_path = args
        .samples
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.library.samples_path));
    let library = load_library(&samples_path, &PoseEmbedder::new(config.embedder))?;
    for (label, count) in library.label_counts() {
        info!("  {}: {} samples", label, count);
    }

    let pipeline = PosePipeline::new(Arc::new(library), &config).context("Invalid pipeline configuration")?;
    let frames = read_stream(&args.stream)?;
    info!("{} frames loaded from {}", frames.len(), args.stream.display());

    let results = match args.fps {
        Some(fps) => replay_threaded(pipeline, &frames, fps)?,
        None => replay(pipeline, &frames),
    };

    if args.json {
        let summary = Summary {
            frames: frames.len(),
            results: &results,
            tokens: results.iter().map(ExerciseResult::token).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for r in &results {
            println!("{}", r.display_label());
        }
    }

    Ok(())
}

fn read_stream(path: &Path) -> Result<Vec<LandmarkSet>> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut frames = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            frames.push(LandmarkSet::empty());
            continue;
        }
        let set: LandmarkSet = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid landmark set", path.display(), i + 1))?;
        frames.push(set);
    }
    Ok(frames)
}

fn replay(mut pipeline: PosePipeline, frames: &[LandmarkSet]) -> Vec<ExerciseResult> {
    let mut shown: Vec<String> = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        let labels: Vec<String> = pipeline.process(frame).iter().map(ExerciseResult::display_label).collect();
        if labels != shown {
            println!("[{:5}] {}", i, labels.join("  "));
            shown = labels;
        }
    }
    info!(
        "classified {} frames, skipped {}",
        pipeline.classified_frames(),
        pipeline.skipped_frames()
    );
    pipeline.results().to_vec()
}

fn replay_threaded(pipeline: PosePipeline, frames: &[LandmarkSet], fps: f32) -> Result<Vec<ExerciseResult>> {
    anyhow::ensure!(fps > 0.0, "fps must be positive, got {}", fps);
    let frame_duration = Duration::from_secs_f32(1.0 / fps);
    let worker = FrameWorker::start(pipeline)?;

    let mut shown_frame = 0;
    let mut last_id = 0;
    for frame in frames {
        let start = Instant::now();
        if let Some(id) = worker.submit(frame.clone()) {
            last_id = id;
        }

        let latest = worker.latest();
        if latest.frame_id != shown_frame && !latest.results.is_empty() {
            let labels: Vec<String> = latest.results.iter().map(ExerciseResult::display_label).collect();
            println!("[{:5}] {}", latest.frame_id, labels.join("  "));
            shown_frame = latest.frame_id;
        }

        if let Some(rest) = frame_duration.checked_sub(start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let published = match worker.wait_for(last_id, Duration::from_secs(5)) {
        Some(p) => p,
        None => {
            warn!("timed out waiting for frame {}", last_id);
            worker.latest()
        }
    };
    if worker.dropped() > 0 {
        warn!("{} frames dropped while the worker was busy", worker.dropped());
    }
    worker.stop();
    Ok(published.results)
}
