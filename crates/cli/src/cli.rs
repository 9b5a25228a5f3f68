//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Acquisition Grabber - multi-source data acquisition controller
#[derive(Parser, Debug)]
#[command(
    name = "acq-grabber",
    author,
    version,
    about = "Multi-source data acquisition controller",
    long_about = "Starts one polling worker per configured data source, collects their \n\
                  records into a bounded shared buffer and drains the oldest half at a \n\
                  fixed interval until stopped."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ACQ_GRABBER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ACQ_GRABBER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run acquisition sessions
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "grabber.toml",
        env = "ACQ_GRABBER_CONFIG"
    )]
    pub config: PathBuf,

    /// Interval between two drains (ms)
    #[arg(
        long,
        default_value = "100",
        value_parser = clap::value_parser!(u64).range(1..),
        env = "ACQ_GRABBER_DRAIN_INTERVAL_MS"
    )]
    pub drain_interval_ms: u64,

    /// Length of each session in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "0", env = "ACQ_GRABBER_DURATION")]
    pub duration_secs: u64,

    /// Number of start/drain/stop rounds
    #[arg(
        long,
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(1..),
        env = "ACQ_GRABBER_SESSIONS"
    )]
    pub sessions: u32,

    /// Override `global.max_entries` from configuration
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), env = "ACQ_GRABBER_MAX_ENTRIES")]
    pub max_entries: Option<u64>,

    /// Override `global.time_between_launches` (ms) from configuration
    #[arg(long, env = "ACQ_GRABBER_STAGGER_MS")]
    pub stagger_ms: Option<u64>,

    /// Validate configuration and exit without starting workers
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ACQ_GRABBER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "grabber.toml", env = "ACQ_GRABBER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "grabber.toml", env = "ACQ_GRABBER_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show driver parameters of each source
    #[arg(long)]
    pub params: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
