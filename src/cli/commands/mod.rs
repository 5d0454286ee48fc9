//! CLI command implementations.

pub mod replay;
pub mod serve;
pub mod strategies;
pub mod validate;

use anyhow::{Context, Result};
use quant_config::{load_config, AppConfig};
use quant_strategies::StrategyRegistry;
use std::path::Path;
use tracing::warn;

/// Load the configuration, falling back to defaults when the file is absent.
pub(crate) fn load_settings(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "configuration file not found, using defaults");
        return Ok(AppConfig::default());
    }
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// The registry limited to the enabled strategies.
pub(crate) fn registry_for(config: &AppConfig) -> Result<StrategyRegistry> {
    let registry = StrategyRegistry::new();
    if config.strategies.enabled.is_empty() {
        return Ok(registry);
    }
    registry
        .restrict_to(&config.strategies.enabled)
        .context("Invalid strategies.enabled")
}
