//! Strategy engine CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use quant_config::{load_config, LogFormat, LoggingConfig};
use quant_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flags win over the configured logging section
    let configured = load_config(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingConfig::default());
    let level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or(configured.level);
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        configured.format
    };
    setup_logging(&level, format)?;

    match cli.command {
        Commands::Serve(args) => cli::commands::serve::run(args, &cli.config).await,
        Commands::Replay(args) => cli::commands::replay::run(args, &cli.config).await,
        Commands::Strategies => cli::commands::strategies::run(&cli.config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
