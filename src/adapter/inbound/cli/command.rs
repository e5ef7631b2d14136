//! Command-line interface definitions.
//!
//! Defines the CLI structure for the tangle application using `clap`.
//! `scan` runs one analysis; `check-config` validates a configuration file
//! without touching the network.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::application::config::AnalysisConfig;

/// Detect inconsistent prices across logically related prediction markets
#[derive(Parser, Debug)]
#[command(name = "tangle")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the tangle CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one analysis over a market snapshot and write a report
    Scan(ScanArgs),

    /// Validate a configuration file
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the `scan` command.
#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Market snapshot JSON file, overriding the configured source
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the JSON report
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Skip writing the report file
    #[arg(long)]
    pub no_report: bool,

    /// Minimum edge confidence in [0, 1]
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Minimum absolute deviation for a signal
    #[arg(long)]
    pub min_deviation: Option<Decimal>,

    /// Markets per oracle batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Oracle batches in flight at once
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Maximum signals printed (all are kept in the report)
    #[arg(long, default_value_t = 20)]
    pub top: usize,
}

impl ScanArgs {
    /// Apply command-line overrides on top of file configuration.
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(value) = self.min_confidence {
            config.min_edge_confidence = value;
        }
        if let Some(value) = self.min_deviation {
            config.min_deviation = value;
        }
        if let Some(value) = self.batch_size {
            config.oracle_batch_size = value;
        }
        if let Some(value) = self.max_in_flight {
            config.max_in_flight_batches = value;
        }
    }
}

/// Arguments for the `check-config` command.
#[derive(Parser, Debug, Clone)]
pub struct CheckConfigArgs {
    /// Configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}
