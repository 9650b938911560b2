//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stonks")]
#[command(author, version, about = "Historical stock and search-interest data aggregator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "STONKS_CONFIG", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (defaults to logging.level from the config)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch data for one symbol
    Get(GetArgs),
    /// List available data sources
    Sources,
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(clap::Args)]
pub struct GetArgs {
    /// Symbol as EXCHANGE:SYMBOL[.EXT], e.g. NYSE:BRK.A
    pub symbol: String,

    /// Keys to fetch (comma-separated); all known keys when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub keys: Vec<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub end: NaiveDate,

    /// Skip the on-disk cache
    #[arg(long)]
    pub no_cache: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Save results to file
    #[arg(long)]
    pub save: Option<PathBuf>,
}
