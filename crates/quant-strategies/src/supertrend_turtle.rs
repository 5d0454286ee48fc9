//! SuperTrend and Turtle in agreement.
//!
//! Runs both strategies on every candle and only passes SuperTrend's signal
//! through when the latched signals of both point the same way.

use quant_core::checkpoint::{self, Checkpoint};
use quant_core::error::{CheckpointError, StrategyError};
use quant_core::traits::{Strategy, StrategyConfig};
use quant_core::types::{Candle, DebugProbe, Signal, SignalKind};
use serde::{Deserialize, Serialize};

use crate::supertrend::{SuperTrendConfig, SuperTrendStrategy};
use crate::turtle::{TurtleConfig, TurtleStrategy};

/// Configuration for the combined strategy: both sub-configurations
/// flattened into one object plus `rememberSignal`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperTrendTurtleConfig {
    #[serde(flatten)]
    pub super_trend: SuperTrendConfig,
    #[serde(flatten)]
    pub turtle: TurtleConfig,
    /// Replace the latched signals on every candle, including with no signal
    pub remember_signal: bool,
}

impl StrategyConfig for SuperTrendTurtleConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        self.super_trend.validate()?;
        self.turtle.validate()
    }
}

/// SuperTrend and Turtle in agreement.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperTrendTurtleStrategy {
    config: SuperTrendTurtleConfig,
    super_trend: SuperTrendStrategy,
    turtle: TurtleStrategy,
    super_trend_signal: Option<Signal>,
    turtle_signal: Option<Signal>,
}

#[derive(Serialize, Deserialize)]
struct SuperTrendTurtleRecord {
    config: SuperTrendTurtleConfig,
    super_trend: String,
    turtle: String,
    super_trend_signal: Option<Signal>,
    turtle_signal: Option<Signal>,
}

impl SuperTrendTurtleStrategy {
    pub const NAME: &'static str = "SuperTrendTurtle";

    pub fn new(config: SuperTrendTurtleConfig) -> Self {
        Self {
            super_trend: SuperTrendStrategy::new(config.super_trend.clone()),
            turtle: TurtleStrategy::new(config.turtle.clone()),
            super_trend_signal: None,
            turtle_signal: None,
            config,
        }
    }

    pub fn config(&self) -> &SuperTrendTurtleConfig {
        &self.config
    }
}

impl Strategy for SuperTrendTurtleStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Trades when SuperTrend and Turtle agree"
    }

    fn preload(&mut self, candle: &Candle) {
        self.super_trend.preload(candle);
        self.turtle.preload(candle);
    }

    fn update(&mut self, candle: &Candle) -> Option<Signal> {
        let super_trend = self.super_trend.update(candle);
        let turtle = self.turtle.update(candle);

        if self.config.remember_signal {
            self.super_trend_signal = super_trend;
            self.turtle_signal = turtle;
        } else {
            self.super_trend_signal = super_trend.or(self.super_trend_signal);
            self.turtle_signal = turtle.or(self.turtle_signal);
        }

        let (super_trend, turtle) = (self.super_trend_signal?, self.turtle_signal?);
        let both_long =
            super_trend.kind == SignalKind::OpenLong && turtle.kind == SignalKind::OpenLong;
        let both_bearish = super_trend.kind.is_bearish() && turtle.kind.is_bearish();
        (both_long || both_bearish).then_some(super_trend)
    }

    fn debug(&self, candle: &Candle) -> Vec<DebugProbe> {
        self.super_trend.debug(candle)
    }
}

impl Checkpoint for SuperTrendTurtleStrategy {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            Self::NAME,
            &SuperTrendTurtleRecord {
                config: self.config.clone(),
                super_trend: self.super_trend.checkpoint()?,
                turtle: self.turtle.checkpoint()?,
                super_trend_signal: self.super_trend_signal,
                turtle_signal: self.turtle_signal,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: SuperTrendTurtleRecord = checkpoint::decode(Self::NAME, data)?;
        record.config.validate().map_err(|e| CheckpointError::Invalid {
            kind: Self::NAME,
            reason: e.to_string(),
        })?;

        let mut restored = Self::new(record.config);
        restored.super_trend.restore(&record.super_trend)?;
        restored.turtle.restore(&record.turtle)?;
        restored.super_trend_signal = record.super_trend_signal;
        restored.turtle_signal = record.turtle_signal;
        *self = restored;
        Ok(())
    }
}
