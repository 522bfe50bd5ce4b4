use anyhow::{Context, Result};
use clap::Parser;
use prometheus_localization::dataset::Dataset;
use prometheus_localization::reporting::{CsvSink, EstimateSink};
use prometheus_localization::{replay, FilterConfig};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Replay a recorded MRCLAM run through the landmark EKF
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset directory containing Barcodes.dat, Landmark_Groundtruth.dat and the robot logs
    #[arg(short, long)]
    data: PathBuf,

    /// Robot number (1-based)
    #[arg(short, long, default_value_t = 1)]
    robot: usize,

    /// Filter configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the start index into the sampled trajectory
    #[arg(short, long)]
    start: Option<usize>,

    /// Write estimates and groundtruth as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FilterConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FilterConfig::default(),
    };
    if let Some(start) = args.start {
        config.start_index = start;
    }

    let dataset = Dataset::load(&args.data, args.robot).with_context(|| {
        format!("Failed to load robot {} from {}", args.robot, args.data.display())
    })?;

    let result = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut sink = CsvSink::new(BufWriter::new(file), path);
            replay(&dataset, &config, Some(&mut sink as &mut dyn EstimateSink))
        }
        None => replay(&dataset, &config, None),
    }
    .context("Localization aborted")?;

    log::info!("Robot {}: {}", args.robot, result.report);
    if let Some(last) = result.estimates.last() {
        log::info!(
            "Final estimate at t={:.2}: ({:.3}, {:.3}, {:.3})",
            last.time,
            last.pose.x,
            last.pose.y,
            last.pose.theta
        );
    }
    Ok(())
}
