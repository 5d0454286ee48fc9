//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use quant_config::Protocol;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quant-runner")]
#[command(author, version, about = "Incremental trading strategy evaluation engine")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "QUANT_CONFIG")]
    pub config: PathBuf,

    /// Log level (defaults to the configured level)
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
    /// Serve strategy sessions over newline-delimited JSON
    Serve(ServeArgs),
    /// Replay a CSV file through one batched session
    Replay(ReplayArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides the configuration)
    #[arg(long)]
    pub listen: Option<String>,

    /// Session protocol: batched or streaming (overrides the configuration)
    #[arg(long)]
    pub protocol: Option<Protocol>,

    /// Run a single session on stdin/stdout instead of listening
    #[arg(long)]
    pub stdio: bool,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
pub struct ReplayArgs {
    /// Strategy to run
    #[arg(short, long)]
    pub strategy: String,

    /// Candle data file (CSV)
    #[arg(long)]
    pub data: PathBuf,

    /// Strategy configuration file (JSON)
    #[arg(long)]
    pub strategy_config: Option<PathBuf>,

    /// Checkpoint file to resume from
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Number of leading candles used for warmup only
    #[arg(long, default_value = "0")]
    pub preload: usize,

    /// Candles per inbound batch
    #[arg(long, default_value = "500")]
    pub batch_size: usize,

    /// Candle interval stamped on loaded data
    #[arg(short, long, default_value = "1m")]
    pub interval: String,

    /// Market identifier stamped on loaded data
    #[arg(long, default_value = "0")]
    pub market: u32,

    /// Symbol identifier stamped on loaded data
    #[arg(long, default_value = "0")]
    pub symbol: u32,

    /// Collect debug series
    #[arg(long)]
    pub debug: bool,

    /// Write the final checkpoint to this file
    #[arg(long)]
    pub save_state: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}
