//! Strategy registry for creating strategies by name.

use crate::{AldoStrategy, SuperTrendStrategy, SuperTrendTurtleStrategy, TurtleStrategy};
use quant_core::error::StrategyError;
use quant_core::traits::{Strategy, StrategyConfig, StrategyEntry, StrategyProvider};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

type Factory = Box<dyn Fn(&str) -> Result<Box<dyn Strategy>, StrategyError> + Send + Sync>;

struct Registration {
    name: &'static str,
    description: &'static str,
    default_config: String,
    factory: Factory,
}

/// Explicit table of the strategies sessions may create.
pub struct StrategyRegistry {
    registrations: Vec<Registration>,
}

impl StrategyRegistry {
    /// Create a registry with all built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(
            SuperTrendStrategy::NAME,
            "Follows ATR SuperTrend bands with a trailing stop",
            SuperTrendStrategy::new,
        );
        registry.register(
            TurtleStrategy::NAME,
            "Donchian channel breakouts with a bull-market SMA filter",
            TurtleStrategy::new,
        );
        registry.register(
            AldoStrategy::NAME,
            "Trades price/oscillator divergences",
            AldoStrategy::new,
        );
        registry.register(
            SuperTrendTurtleStrategy::NAME,
            "Trades when SuperTrend and Turtle agree",
            SuperTrendTurtleStrategy::new,
        );
        registry
    }

    /// Create a registry with no strategies.
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Register a strategy built from a JSON configuration of type `C`.
    pub fn register<C, S>(&mut self, name: &'static str, description: &'static str, build: fn(C) -> S)
    where
        C: StrategyConfig + Default + Serialize + DeserializeOwned,
        S: Strategy + 'static,
    {
        let default_config = match serde_json::to_string(&C::default()) {
            Ok(json) => json,
            Err(err) => {
                warn!(strategy = name, error = %err, "default configuration is not serializable");
                String::from("{}")
            }
        };
        let factory: Factory = Box::new(move |raw: &str| {
            let config = parse_config::<C>(raw)?;
            config.validate()?;
            Ok(Box::new(build(config)) as Box<dyn Strategy>)
        });
        self.registrations.retain(|r| r.name != name);
        self.registrations.push(Registration {
            name,
            description,
            default_config,
            factory,
        });
    }

    /// Keep only the named strategies, in the given order. Repeated names
    /// are kept once.
    pub fn restrict_to(mut self, names: &[String]) -> Result<Self, StrategyError> {
        let mut kept: Vec<Registration> = Vec::with_capacity(names.len());
        for name in names {
            if kept.iter().any(|r| r.name == name.as_str()) {
                continue;
            }
            let position = self
                .registrations
                .iter()
                .position(|r| r.name == name.as_str())
                .ok_or_else(|| StrategyError::NotFound(name.clone()))?;
            kept.push(self.registrations.swap_remove(position));
        }
        Ok(Self {
            registrations: kept,
        })
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|r| r.name).collect()
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Get the description of a strategy.
    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.find(name).map(|r| r.description)
    }

    /// Default configuration of a strategy as JSON text.
    pub fn default_config(&self, name: &str) -> Option<&str> {
        self.find(name).map(|r| r.default_config.as_str())
    }

    fn find(&self, name: &str) -> Option<&Registration> {
        self.registrations.iter().find(|r| r.name == name)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyProvider for StrategyRegistry {
    fn entries(&self) -> Vec<StrategyEntry> {
        self.registrations
            .iter()
            .map(|r| StrategyEntry {
                name: r.name.to_string(),
                default_config: r.default_config.clone(),
            })
            .collect()
    }

    fn create(&self, name: &str, config: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let registration = self
            .find(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        let strategy = (registration.factory)(config)?;
        debug!(strategy = name, "created strategy instance");
        Ok(strategy)
    }
}

/// A blank configuration selects the defaults.
fn parse_config<C: Default + DeserializeOwned>(raw: &str) -> Result<C, StrategyError> {
    if raw.trim().is_empty() {
        return Ok(C::default());
    }
    serde_json::from_str(raw).map_err(|e| StrategyError::InvalidConfig(e.to_string()))
}
