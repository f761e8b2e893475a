//! CLI for benchtrail.
//!
//! This crate provides the `benchtrail` command line tool, which appends CI
//! benchmark runs to `data.js` history files and inspects those files.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commands;
pub mod settings;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub use settings::Settings;

/// Environment variable holding a log filter.
pub const LOG_ENV: &str = "BENCHTRAIL_LOG";

/// benchtrail CLI.
#[derive(Parser, Debug)]
#[command(name = "benchtrail")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./benchtrail.toml when present).
    #[arg(short, long, global = true, env = "BENCHTRAIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append one run, parsed from harness output, to a history file.
    ///
    /// The history file is created when it does not exist yet.
    Append {
        /// History file to append to.
        #[arg(short, long)]
        data: PathBuf,

        /// Harness output format (ndjson, cargo, customSmallerIsBetter,
        /// customBiggerIsBetter).
        #[arg(short, long)]
        tool: String,

        /// File holding the harness output.
        #[arg(short, long)]
        output_file: PathBuf,

        /// JSON file with the commit metadata, either the commit object
        /// itself or a push event carrying it under `head_commit`.
        #[arg(long)]
        commit_file: PathBuf,

        /// Suite to append to (overrides config).
        #[arg(short, long)]
        suite: Option<String>,

        /// Keep at most this many runs in the suite (overrides config).
        #[arg(long)]
        max_items: Option<usize>,

        /// Recorded date in epoch milliseconds (defaults to now).
        #[arg(long)]
        date: Option<i64>,

        /// Repository URL to store in the file (overrides config).
        #[arg(long)]
        repo_url: Option<String>,

        /// Print a markdown comparison with the baseline run.
        #[arg(long)]
        compare: bool,
    },

    /// Check history files against the data-model invariants.
    Validate {
        /// History files to check.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Export per-test time series as JSON.
    Series {
        /// History file to read.
        data: PathBuf,

        /// Suite to export (overrides config).
        #[arg(short, long)]
        suite: Option<String>,

        /// Only export this test.
        #[arg(short, long)]
        test: Option<String>,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a markdown report of a history file.
    Report {
        /// History file to read.
        data: PathBuf,

        /// Only report this suite.
        #[arg(short, long)]
        suite: Option<String>,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Drop the oldest runs of a suite beyond a cap.
    Prune {
        /// History file to rewrite.
        data: PathBuf,

        /// Number of runs to keep (overrides config).
        #[arg(short, long)]
        max_items: Option<usize>,

        /// Suite to prune (overrides config).
        #[arg(short, long)]
        suite: Option<String>,
    },

    /// List history files found under a results directory.
    List {
        /// Results directory to scan.
        root: PathBuf,
    },

    /// Show the effective configuration.
    Status {
        /// Show detailed status information.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Errors raised by the CLI layer itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    /// A configuration value is out of range.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// A required value was given neither as a flag nor in the config.
    #[error("Missing value: {0}")]
    Missing(&'static str),

    /// One or more history files failed validation.
    #[error("{0} file(s) failed validation")]
    ValidationFailed(usize),

    /// A requested suite or test does not exist in the file.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<CliError>() {
        return match e {
            CliError::Configuration(_) | CliError::InvalidSetting(_) | CliError::Missing(_) => 2,
            CliError::ValidationFailed(_) => 4,
            CliError::NotFound(_) => 1,
        };
    }
    if let Some(e) = err.downcast_ref::<benchtrail_datafile::Error>() {
        return match e {
            benchtrail_datafile::Error::Io { .. } | benchtrail_datafile::Error::Walk(_) => 3,
            _ => 4,
        };
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return 3;
    }
    if let Some(benchtrail_core::Error::UnknownSuite(_)) = err.downcast_ref() {
        return 1;
    }
    if err.downcast_ref::<benchtrail_adapters::AdapterError>().is_some()
        || err.downcast_ref::<benchtrail_core::Error>().is_some()
        || err.downcast_ref::<serde_json::Error>().is_some()
    {
        return 4;
    }
    1
}

/// Install the tracing subscriber.
///
/// `BENCHTRAIL_LOG` wins over `RUST_LOG`; without either, `-v` flags raise
/// the configured level.
pub fn init_tracing(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI with the process arguments.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, &settings.log_level);
    tracing::debug!(?settings, "Settings loaded");
    commands::dispatch(cli.command, &settings)
}
