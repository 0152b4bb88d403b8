//! Converts a raw-landmark pose sample CSV into the embedded row format,
//! so the reference library loads without re-embedding on every start.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rep_tracker::classify::{read_samples, write_samples, PoseLibrary};
use rep_tracker::config::Config;
use rep_tracker::pose::PoseEmbedder;

#[derive(Parser, Debug)]
#[command(name = "embed_samples", version = env!("GIT_VERSION"), about = "Pre-embed reference pose samples")]
struct Args {
    /// Input CSV (`name,label,x0,y0,z0,...`)
    input: PathBuf,

    /// Output CSV (`name,label,e0,e1,...`)
    output: PathBuf,

    /// Config file, for embedder settings
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(&args.config);
    let embedder = PoseEmbedder::new(config.embedder);

    let input = File::open(&args.input).with_context(|| format!("Failed to open {}", args.input.display()))?;
    let samples = read_samples(BufReader::new(input), &embedder)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    let library = PoseLibrary::load(samples.clone())?;
    for (label, count) in library.label_counts() {
        info!("{}: {} samples", label, count);
    }

    let output = File::create(&args.output).with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(output);
    write_samples(&mut writer, &samples)?;
    writer.flush()?;

    info!("wrote {} embedded samples to {}", samples.len(), args.output.display());
    Ok(())
}
