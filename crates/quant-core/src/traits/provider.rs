//! Strategy discovery and construction.

use crate::error::StrategyError;
use crate::traits::Strategy;
use serde::{Deserialize, Serialize};

/// A strategy that can be created by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyEntry {
    pub name: String,
    /// Default configuration as JSON text
    pub default_config: String,
}

/// Source of strategy instances for sessions.
pub trait StrategyProvider: Send + Sync {
    /// All strategies this provider can create.
    fn entries(&self) -> Vec<StrategyEntry>;

    /// Create a fresh instance from a JSON configuration blob.
    fn create(&self, name: &str, config: &str) -> Result<Box<dyn Strategy>, StrategyError>;
}
