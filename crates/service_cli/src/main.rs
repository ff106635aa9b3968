//! Merton CLI - Command Line Operations for Structural Credit Risk
//!
//! This is the operational entry point for the Merton credit engine.
//!
//! # Commands
//!
//! - `merton solve --input <panel.csv>` - Asset values, DD and PD per row
//! - `merton bootstrap --input <panel.csv>` - Confidence intervals
//! - `merton sensitivity --equity .. --equity-vol .. --debt .. --rate ..` - Sweeps
//! - `merton stress --equity .. --equity-vol .. --debt .. --rate ..` - Scenarios
//! - `merton calibrate` - Logistic DD → PD mapping
//!
//! # Architecture
//!
//! As the service layer, this crate wires the configuration, the CSV readers
//! and the `merton_risk` engines into a single command-line interface.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use merton_models::structural::Measure;
use merton_risk::config::EngineConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod input;
mod output;

pub use error::{CliError, Result};

use commands::bootstrap::BootstrapOverrides;
use commands::calibrate::TrainingSource;
use commands::BaseArgs;

/// Merton structural credit-risk engine CLI
#[derive(Parser)]
#[command(name = "merton")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve every row of a panel and report DD/PD
    Solve {
        /// Panel CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Measure (risk-neutral, real-world); overrides the configuration
        #[arg(short, long)]
        measure: Option<Measure>,

        /// Output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bootstrap confidence intervals for the most recent rows
    Bootstrap {
        /// Panel CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Rows per entity (0 keeps all)
        #[arg(short = 'k', long)]
        most_recent: Option<usize>,

        /// Draws per row
        #[arg(short = 'n', long)]
        iterations: Option<usize>,

        /// Master seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sweep volatility, debt and rate around one observation
    Sensitivity {
        #[command(flatten)]
        base: BaseArgs,

        /// Measure of the reported DD/PD
        #[arg(short, long, default_value = "risk-neutral")]
        measure: Measure,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evaluate stress scenarios against one observation
    Stress {
        #[command(flatten)]
        base: BaseArgs,

        /// Scenario keys (repeatable); all registered scenarios when omitted
        #[arg(short, long = "scenario")]
        scenarios: Vec<String>,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit the logistic DD → PD calibration
    Calibrate {
        /// Training CSV with `dd,default` columns
        #[arg(short, long, conflicts_with = "synthetic")]
        input: Option<PathBuf>,

        /// Size of a synthetic training sample
        #[arg(long, default_value = "5000")]
        synthetic: usize,

        /// Default rate of the synthetic sample
        #[arg(long, default_value = "0.02")]
        default_rate: f64,

        /// Seed of the synthetic sample
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::resolve(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("loading configuration from {}", path.display()),
        None => "loading configuration from the environment".to_string(),
    })?;

    // RUST_LOG wins over the configured level
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_filter_str()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let result = match cli.command {
        Commands::Solve {
            input,
            measure,
            output,
        } => commands::solve::run(&config, &input, measure, output.as_deref()),
        Commands::Bootstrap {
            input,
            most_recent,
            iterations,
            seed,
            output,
        } => commands::bootstrap::run(
            &config,
            &input,
            BootstrapOverrides {
                most_recent,
                iterations,
                seed,
            },
            output.as_deref(),
        ),
        Commands::Sensitivity {
            base,
            measure,
            output,
        } => commands::sensitivity::run(&config, &base, measure, output.as_deref()),
        Commands::Stress {
            base,
            scenarios,
            output,
        } => commands::stress::run(&config, &base, &scenarios, output.as_deref()),
        Commands::Calibrate {
            input,
            synthetic,
            default_rate,
            seed,
            output,
        } => {
            let source = match &input {
                Some(path) => TrainingSource::File(path.as_path()),
                None => TrainingSource::Synthetic {
                    n: synthetic,
                    default_rate,
                    seed,
                },
            };
            commands::calibrate::run(source, output.as_deref())
        }
    };
    Ok(result?)
}
