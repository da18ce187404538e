//! CLI for estimating height and posture from a photo in front of the ruler poster.
//!
//! Usage:
//!   measure-mates <image>                           # Human-readable output
//!   measure-mates <image> --json                    # JSON output
//!   measure-mates <image> -o annotated.png          # Save the annotated image
//!   measure-mates <image> --landmarks pose.json     # Use stored landmarks instead of the model

use clap::Parser;
use measure_mates_lib::{prepare_bridge, Config, Measurement, ModelChoice};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "measure-mates")]
#[command(author, version, about = "Height and posture estimation from a single image", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Configuration file (JSON); defaults are used if it does not exist
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pose model variant: lite, full or heavy
    #[arg(long)]
    model: Option<ModelChoice>,

    /// Directory where pose models are cached
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Stored pose landmarks (JSON) to use instead of running the model
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Write the annotated image to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };
    if let Some(choice) = args.model {
        config.model.choice = choice;
    }
    if let Some(dir) = &args.model_dir {
        config.model.cache_dir = dir.clone();
    }
    config.validate()?;

    let bridge = prepare_bridge(args.landmarks.as_deref(), &config.model)?;

    let measurement = Measurement::new(&config);
    let (report, annotated) = measurement.measure_file(&args.image, &*bridge)?;

    if let Some(path) = &args.output {
        annotated.save(path)?;
        tracing::info!("Annotated image written to {:?}", path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_text());
    }

    Ok(())
}
