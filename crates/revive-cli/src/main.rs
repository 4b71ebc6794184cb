// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Revive — camera-aware correction and enhancement for digitized images.
//
// Entry point. Parses the command line, initialises logging, and drives the
// parallel batch loop: decode, correct, denoise, enhance, sharpen, save.
// Per-file failures are reported and never abort the batch.

mod decode;
mod discover;
mod exif;
mod writer;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{error, info, warn};

use revive_core::error::Result;
use revive_core::{DenoiseConfig, DenoiseStrength, EnhancementConfig, SharpenConfig};
use revive_pipeline::{PipelineOrchestrator, ProfileRegistry};

use writer::OutputFormat;

#[derive(Parser)]
#[command(name = "revive")]
#[command(version, about = "Camera-aware image correction and enhancement", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an image file or a directory of images
    Process(ProcessArgs),

    /// List the registered camera profiles
    Cameras {
        /// Dump each profile as JSON
        #[arg(long)]
        detail: bool,
    },
}

#[derive(Args)]
struct ProcessArgs {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Camera profile key (see `revive cameras`)
    #[arg(short, long, value_name = "KEY")]
    camera: Option<String>,

    /// Ad-hoc camera profile JSON file (overrides --camera)
    #[arg(long, value_name = "FILE")]
    profile_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tiff)]
    format: OutputFormat,

    /// JPEG quality 1-100
    #[arg(short, long, default_value_t = 95)]
    quality: u8,

    /// Denoise strength
    #[arg(short, long, default_value_t = DenoiseStrength::Auto)]
    denoise: DenoiseStrength,

    /// Disable the edge-preserving denoise blend
    #[arg(long)]
    no_preserve_detail: bool,

    /// Contrast multiplier
    #[arg(long, default_value_t = 1.1)]
    contrast: f32,

    /// Exposure compensation in stops
    #[arg(long, default_value_t = 0.0)]
    exposure: f32,

    /// Saturation multiplier
    #[arg(long, default_value_t = 1.05)]
    saturation: f32,

    /// Shadow lift strength 0-1
    #[arg(long, default_value_t = 0.0)]
    shadows: f32,

    /// Highlight compression strength 0-1
    #[arg(long, default_value_t = 0.0)]
    highlights: f32,

    /// Disable the midtone S-curve
    #[arg(long)]
    no_curve: bool,

    /// Sharpening strength (0 disables)
    #[arg(long, default_value_t = 1.0)]
    sharpen: f32,

    /// Sharpening radius
    #[arg(long, default_value_t = 1.0)]
    radius: f32,

    /// Sharpening threshold in 8-bit units
    #[arg(long, default_value_t = 3)]
    threshold: u32,

    /// Worker thread count (default: one per CPU)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Cameras { detail } => run_cameras(detail),
        Commands::Process(args) => match run_process(args) {
            Ok(code) => code,
            Err(err) => {
                error!(%err, "Processing aborted");
                eprintln!("Error: {err}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

fn run_cameras(detail: bool) -> i32 {
    let registry = ProfileRegistry::builtin();
    println!("Available camera profiles:");
    for key in registry.keys() {
        let profile = registry.get(key).expect("key came from the registry");
        println!("  {key:20} - {}", profile.name);
        if detail {
            match serde_json::to_string_pretty(profile) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("  (failed to serialize: {err})"),
            }
        }
    }
    0
}

fn run_process(args: ProcessArgs) -> Result<i32> {
    if let Some(threads) = args.threads {
        if let Err(err) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!(%err, "Could not configure worker pool; using defaults");
        }
    }

    // Resolve the profile selection up front so a typo fails before any
    // decoding work starts.
    let mut registry = ProfileRegistry::builtin();
    let explicit = if let Some(path) = &args.profile_file {
        let profile = ProfileRegistry::load_profile_file(path)?;
        info!(profile = %profile.name, "Ad-hoc profile loaded");
        registry.register("custom", profile);
        Some("custom".to_string())
    } else {
        args.camera.clone()
    };
    if let Some(key) = &explicit {
        registry.get(key)?;
    }

    let orchestrator = PipelineOrchestrator::new(
        registry,
        EnhancementConfig {
            contrast: args.contrast,
            exposure: args.exposure,
            saturation: args.saturation,
            shadows: args.shadows,
            highlights: args.highlights,
            curve: !args.no_curve,
        },
        DenoiseConfig {
            strength: args.denoise,
            preserve_detail: !args.no_preserve_detail,
        },
        SharpenConfig {
            strength: args.sharpen,
            radius: args.radius,
            threshold: args.threshold,
        },
    );

    let files = discover::discover(&args.input)?;
    if files.is_empty() {
        eprintln!("No image files found in '{}'", args.input.display());
        return Ok(1);
    }
    std::fs::create_dir_all(&args.output)?;

    info!(count = files.len(), format = %args.format, "Starting batch");

    let processed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    files.par_iter().for_each(|path| {
        let outcome = process_one(
            path,
            &args.output,
            &orchestrator,
            explicit.as_deref(),
            args.format,
            args.quality,
        );
        match outcome {
            Ok(out_path) => {
                processed.fetch_add(1, Ordering::Relaxed);
                info!(input = %path.display(), output = %out_path.display(), "File processed");
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::Relaxed);
                error!(input = %path.display(), %err, "File failed");
                eprintln!("  {}: {err}", path.display());
            }
        }
    });

    let processed = processed.load(Ordering::Relaxed);
    let failed = failed.load(Ordering::Relaxed);
    println!("Done! Processed {processed} file(s)");
    if failed > 0 {
        println!("  ({failed} failed)");
    }
    println!("Output: {}", args.output.display());

    Ok(if failed > 0 { 1 } else { 0 })
}

/// Run one file through the pipeline: metadata, decode, process, save.
fn process_one(
    path: &std::path::Path,
    output_dir: &std::path::Path,
    orchestrator: &PipelineOrchestrator,
    explicit: Option<&str>,
    format: OutputFormat,
    quality: u8,
) -> Result<PathBuf> {
    let metadata = exif::read_metadata(path);
    let raster = decode::decode_raster(path)?;
    let result = orchestrator.process(&raster, explicit, &metadata)?;

    let out_path = writer::output_path(path, output_dir, format);
    writer::save(result, &out_path, format, quality)?;
    Ok(out_path)
}
