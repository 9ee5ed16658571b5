//! Command-line interface for the meeting-point engine.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::loaders;
use crate::core::point::{Point, Preference};
use crate::core::writers;
use crate::processors::arbiter::{self, ArbiterReport};
use crate::processors::merge::merge_nearby;
use crate::processors::scorer::ScoredCluster;
use crate::EngineConfig;

#[derive(Parser)]
#[command(name = "meetpoint")]
#[command(about = "Find meeting points that cover every requested category", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank meeting-point clusters for a points file (JSON or CSV)
    Cluster {
        /// Input points file
        points_file: PathBuf,
        /// Preference in [0, 1]; higher accepts looser clusters
        #[arg(short, long, conflicts_with = "level")]
        preference: Option<f64>,
        /// Preference on the -2..=2 scale; higher is stricter
        #[arg(long, allow_negative_numbers = true)]
        level: Option<i8>,
        /// Write clusters to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output file format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Merge same-category points closer than this many meters first
        #[arg(long)]
        merge_radius: Option<f64>,
        /// Seed for the k-means strategy
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run every strategy and print its metric
    Strategies {
        /// Input points file
        points_file: PathBuf,
        /// Preference in [0, 1]
        #[arg(short, long, default_value_t = 0.5)]
        preference: f64,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 37 {
            format!("{}...", value.chars().take(34).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<37} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn print_clusters(clusters: &[ScoredCluster]) {
    for cluster in clusters {
        println!(
            "#{:<3} center ({:.6}, {:.6})  radius {:>7.1} m  wcss {:.3e}",
            cluster.rank, cluster.center.lat, cluster.center.lng, cluster.radius_m, cluster.wcss
        );
        for point in &cluster.points {
            println!("       {:<24} ({:.6}, {:.6})", point.category, point.lat, point.lng);
        }
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match &cli.config {
        Some(path) => match EngineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                EngineConfig::default()
            }
        },
        None => EngineConfig::default(),
    };

    let outcome = match cli.command {
        Commands::Cluster {
            points_file,
            preference,
            level,
            output,
            format,
            merge_radius,
            seed,
        } => cmd_cluster(
            &points_file,
            preference,
            level,
            output.as_deref(),
            format,
            merge_radius,
            seed,
            config,
        ),
        Commands::Strategies {
            points_file,
            preference,
        } => cmd_strategies(&points_file, preference, &config),
        Commands::InitConfig { path } => cmd_init_config(&path),
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn resolve_preference(preference: Option<f64>, level: Option<i8>) -> Result<Preference> {
    let pref = match (preference, level) {
        (Some(value), _) => Preference::new(value)?,
        (None, Some(level)) => Preference::from_level(level)?,
        (None, None) => Preference::default(),
    };
    Ok(pref)
}

/// Load points and apply the merge pre-pass when configured.
fn prepare_points(points_file: &Path, config: &EngineConfig) -> Result<Vec<Point>> {
    let points = loaders::load_points(points_file)
        .with_context(|| format!("failed to load points from {}", points_file.display()))?;

    if !config.merge.enabled {
        return Ok(points);
    }
    let merged = merge_nearby(&points, config.merge.radius_m);
    info!(
        "Merged {} points into {} within {} m",
        points.len(),
        merged.len(),
        config.merge.radius_m
    );
    Ok(merged)
}

#[allow(clippy::too_many_arguments)]
fn cmd_cluster(
    points_file: &Path,
    preference: Option<f64>,
    level: Option<i8>,
    output: Option<&Path>,
    format: OutputFormat,
    merge_radius: Option<f64>,
    seed: Option<u64>,
    mut config: EngineConfig,
) -> Result<()> {
    let start = Instant::now();

    if let Some(radius) = merge_radius {
        config.merge.enabled = true;
        config.merge.radius_m = radius;
    }
    if let Some(seed) = seed {
        config.partition.seed = seed;
    }

    let preference = resolve_preference(preference, level)?;
    let points = prepare_points(points_file, &config)?;

    println!("Finding meeting points...");
    println!("Input: {}", points_file.display());
    println!("Points: {}", points.len());
    println!("Preference: {}", preference.value());

    let spinner = create_spinner("Running clustering strategies...");
    let report = arbiter::run_strategies(&points, preference, &config);
    spinner.finish_and_clear();
    let report = report.context("clustering failed")?;

    let winner = report
        .winner
        .map_or_else(|| "none".to_string(), |w| w.to_string());
    let clusters = report.into_clusters();

    if let Some(path) = output {
        match format {
            OutputFormat::Json => writers::write_clusters_json(path, &clusters)?,
            OutputFormat::Csv => writers::write_clusters_csv(path, &clusters)?,
        }
        info!("Clusters -> {}", path.display());
    }

    print_summary(
        "Meeting Points Found",
        &[
            ("Input file", points_file.display().to_string()),
            ("Points", points.len().to_string()),
            ("Preference", preference.value().to_string()),
            ("Strategy", winner),
            ("Clusters", clusters.len().to_string()),
            (
                "Output",
                output.map_or_else(|| "-".to_string(), |p| p.display().to_string()),
            ),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    if clusters.is_empty() {
        println!("No location covers every category at this preference.");
    } else {
        print_clusters(&clusters);
    }

    Ok(())
}

fn print_report(report: &ArbiterReport) {
    println!("{:<12} {:>10} {:>8} {:>14}", "strategy", "candidates", "valid", "metric");
    for result in &report.results {
        let marker = if Some(result.method) == report.winner { "*" } else { " " };
        println!(
            "{:<12} {:>10} {:>8} {:>14.4e}{}",
            result.method_name(),
            result.candidates,
            result.scored_clusters.len(),
            result.combined_metric,
            marker
        );
    }
}

fn cmd_strategies(points_file: &Path, preference: f64, config: &EngineConfig) -> Result<()> {
    let preference = Preference::new(preference)?;
    let points = prepare_points(points_file, config)?;

    let spinner = create_spinner("Running clustering strategies...");
    let report = arbiter::run_strategies(&points, preference, config);
    spinner.finish_and_clear();

    print_report(&report.context("clustering failed")?);
    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file {}", path.display());
    }
    EngineConfig::default()
        .to_yaml(path)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
