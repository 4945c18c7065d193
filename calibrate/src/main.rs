use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use soilseg::batch::{collect_inputs, image_id, write_stage_images};
use soilseg::io::save_png;
use soilseg::{
    load_image, run_batch, Analyzer, BatchOptions, CalibrationSession, MeanSource,
    PipelineConfig, SharedConfig, StopToken,
};

#[derive(Parser)]
#[command(name = "calibrate")]
#[command(version, about = "Soil sample color segmentation and region counting", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "FILTER", default_value = "info", global = true)]
    log_level: String,

    /// Directory for rolling log files
    #[arg(long, value_name = "DIR", default_value = "logs", global = true)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every image of a file list and write a summary CSV
    Batch {
        /// Text file with one image path per line, or a directory of images
        #[arg(value_name = "LIST")]
        list: PathBuf,

        /// Pipeline config (yaml, json or toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output directory for stage images and summary.csv
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        out: PathBuf,

        /// Summary CSV path (defaults to <out>/summary.csv)
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,

        /// Only write the summary, no stage images
        #[arg(long)]
        no_stages: bool,

        /// How channel means are derived from the histograms
        #[arg(long, value_enum, default_value_t = MeanArg::Display)]
        mean: MeanArg,
    },

    /// Re-run segmentation on one image every tick until 'q' is entered
    Run {
        /// Input image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Pipeline config; edits to the file are picked up while running
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Tick interval in milliseconds
        #[arg(long, value_name = "MS", default_value = "20")]
        tick_ms: u64,

        /// Stop after this many passes
        #[arg(long, value_name = "N")]
        passes: Option<usize>,

        /// Write the overlay here whenever the region count changes
        #[arg(short, long, value_name = "FILE")]
        overlay: Option<PathBuf>,
    },

    /// Run one pass over a single image and print its statistics as JSON
    Analyze {
        /// Input image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Pipeline config (yaml, json or toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Also write stage images into this directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = MeanArg::Display)]
        mean: MeanArg,
    },

    /// Write a config file with the default parameters
    InitConfig {
        /// Destination; the extension selects the format
        #[arg(value_name = "FILE", default_value = "soilseg.yaml")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MeanArg {
    /// Mean of the display-normalized bins (legacy)
    Display,
    /// Mean of the raw bin counts
    Bins,
    /// Count-weighted mean sample value
    Intensity,
}

impl From<MeanArg> for MeanSource {
    fn from(arg: MeanArg) -> Self {
        match arg {
            MeanArg::Display => MeanSource::DisplayNormalized,
            MeanArg::Bins => MeanSource::BinCounts,
            MeanArg::Intensity => MeanSource::Intensity,
        }
    }
}

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    image: &'a Path,
    config: &'a PipelineConfig,
    region_count: usize,
    accepted: Vec<AcceptedRegion>,
    features: [f32; 6],
}

#[derive(Serialize)]
struct AcceptedRegion {
    area: f64,
    centroid: (f64, f64),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    common::log_setup::setup_logging(&cli.log_level, &cli.log_dir, "calibrate")?;

    match cli.command {
        Commands::Batch {
            list,
            config,
            out,
            summary,
            no_stages,
            mean,
        } => {
            let config = load_config(config.as_deref())?;
            let images = collect_inputs(&list)?;
            tracing::info!(list = %list.display(), images = images.len(), "Starting batch");

            let mut options = BatchOptions::new(out);
            if let Some(summary) = summary {
                options.summary_path = summary;
            }
            options.write_stages = !no_stages;
            options.analyzer = Analyzer::new(mean.into());

            let report = run_batch(&images, &config, &options)?;
            for failure in &report.failures {
                eprintln!("failed: {}: {}", failure.path.display(), failure.error);
            }
            println!(
                "{} of {} images processed, summary at {}",
                report.processed.len(),
                report.total(),
                options.summary_path.display()
            );
        }

        Commands::Run {
            image,
            config,
            tick_ms,
            passes,
            overlay,
        } => run_interactive(&image, config, tick_ms, passes, overlay)?,

        Commands::Analyze {
            image,
            config,
            out,
            mean,
        } => {
            let config = load_config(config.as_deref())?;
            let input = load_image(&image)?;
            let analysis = Analyzer::new(mean.into()).analyze(&input, &config)?;

            if let Some(out) = out {
                std::fs::create_dir_all(&out)
                    .with_context(|| format!("Failed to create {}", out.display()))?;
                let id = image_id(&image);
                write_stage_images(&out, &id, &analysis)?;
            }

            let output = AnalyzeOutput {
                image: &image,
                config: &config,
                region_count: analysis.region_count(),
                accepted: analysis
                    .pass
                    .tracking
                    .accepted
                    .iter()
                    .map(|region| AcceptedRegion {
                        area: region.area,
                        centroid: region.centroid,
                    })
                    .collect(),
                features: *analysis.features().values(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists, pass --force to replace it", path.display());
            }
            PipelineConfig::default().save(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}

/// Loads a config file or falls back to defaults, then validates it.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load_validated(path)?,
        None => PipelineConfig::default(),
    };
    Ok(config)
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn run_interactive(
    image_path: &Path,
    config_path: Option<PathBuf>,
    tick_ms: u64,
    passes: Option<usize>,
    overlay_path: Option<PathBuf>,
) -> Result<()> {
    let initial = load_config(config_path.as_deref())?;

    let image = load_image(image_path)?;
    let shared = SharedConfig::new(initial);
    let stop = StopToken::new();

    {
        let stop = stop.clone();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines().map_while(|line| line.ok()) {
                if line.trim() == "q" {
                    stop.stop();
                    return;
                }
            }
        });
    }

    let mut session = CalibrationSession::new(image, shared.clone(), stop)
        .with_tick(Duration::from_millis(tick_ms));
    if let Some(passes) = passes {
        session = session.with_max_passes(passes);
    }

    let histograms = session.histograms();
    tracing::info!(features = ?histograms.features.values(), "Histogram features");
    println!("Running, enter 'q' to quit");

    let mut seen_modified = config_path.as_deref().and_then(modified_time);

    let summary = session.run(|report, output| {
        if report.count_changed {
            println!("{}", report.region_count);
            if let Some(path) = &overlay_path {
                save_png(&output.tracking.overlay, path)?;
            }
        }

        if let Some(path) = &config_path {
            let modified = modified_time(path);
            if modified.is_some() && modified != seen_modified {
                seen_modified = modified;
                match PipelineConfig::load_validated(path) {
                    Ok(config) => {
                        let version = shared.publish(config);
                        tracing::info!(path = %path.display(), version, "Reloaded config");
                    }
                    Err(err) => tracing::warn!("Keeping previous config: {}", err),
                }
            }
        }
        Ok(())
    })?;

    tracing::info!(
        passes = summary.passes,
        skipped = summary.skipped,
        "Session finished"
    );
    Ok(())
}
