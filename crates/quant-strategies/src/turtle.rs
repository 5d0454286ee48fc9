//! Turtle Trading Strategy.
//!
//! Donchian channel breakouts on closes: a fast and a slow system, each
//! with an entry and an exit channel, filtered by a long SMA so that no
//! long is opened while price sits below it.

use quant_core::checkpoint::{self, Checkpoint};
use quant_core::error::{CheckpointError, StrategyError};
use quant_core::traits::{Indicator, Strategy, StrategyConfig};
use quant_core::types::{Candle, Signal};
use quant_core::window::RingWindow;
use quant_indicators::Sma;
use serde::{Deserialize, Serialize};

/// Configuration for the Turtle strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurtleConfig {
    /// Fast system entry channel length
    pub enter_fast: usize,
    /// Fast system exit channel length
    pub exit_fast: usize,
    /// Slow system entry channel length
    pub enter_slow: usize,
    /// Slow system exit channel length
    pub exit_slow: usize,
    /// Bull-market filter SMA period
    pub bull_period: usize,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            enter_fast: 20,
            exit_fast: 10,
            enter_slow: 55,
            exit_slow: 20,
            bull_period: 50,
        }
    }
}

impl TurtleConfig {
    /// Longest channel, which sizes the close history.
    pub fn longest_channel(&self) -> usize {
        self.enter_fast
            .max(self.exit_fast)
            .max(self.enter_slow)
            .max(self.exit_slow)
    }
}

impl StrategyConfig for TurtleConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        let channels = [self.enter_fast, self.exit_fast, self.enter_slow, self.exit_slow];
        if channels.contains(&0) {
            return Err(StrategyError::InvalidConfig(
                "Channel lengths must be at least 1".into(),
            ));
        }
        if self.bull_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Bull filter period must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breakout {
    EnterFast,
    ExitFast,
    EnterSlow,
    ExitSlow,
}

impl Breakout {
    fn is_entry(self) -> bool {
        matches!(self, Breakout::EnterFast | Breakout::EnterSlow)
    }
}

/// Turtle Trading Strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct TurtleStrategy {
    config: TurtleConfig,
    closes: RingWindow,
    age: usize,
    bull_filter: Sma,
}

#[derive(Serialize, Deserialize)]
struct TurtleRecord {
    config: TurtleConfig,
    closes: RingWindow,
    age: usize,
    bull_filter: String,
}

impl TurtleStrategy {
    pub const NAME: &'static str = "Turtle";

    /// Create a new Turtle strategy.
    pub fn new(config: TurtleConfig) -> Self {
        let closes = RingWindow::new(config.longest_channel());
        let bull_filter = Sma::new(config.bull_period);
        Self {
            config,
            closes,
            age: 0,
            bull_filter,
        }
    }

    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    /// Highest and lowest close over the last `count` candles.
    fn channel(&self, count: usize) -> (f64, f64) {
        let age = self.age as i64;
        (0..count as i64)
            .map(|i| self.closes.get(age - i))
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(high, low), close| {
                (high.max(close), low.min(close))
            })
    }

    /// Record the close and test the channels. Later matches override earlier ones.
    fn advance(&mut self, candle: &Candle) -> Option<Breakout> {
        self.bull_filter.update(candle);
        self.closes.set(self.age as i64, candle.close);
        let price = candle.close;

        let mut breakout = None;
        if self.age >= self.config.enter_fast && price == self.channel(self.config.enter_fast).0 {
            breakout = Some(Breakout::EnterFast);
        }
        if self.age >= self.config.exit_fast && price == self.channel(self.config.exit_fast).1 {
            breakout = Some(Breakout::ExitFast);
        }
        if self.age >= self.config.enter_slow && price == self.channel(self.config.enter_slow).0 {
            breakout = Some(Breakout::EnterSlow);
        }
        if self.age >= self.config.exit_slow && price == self.channel(self.config.exit_slow).1 {
            breakout = Some(Breakout::ExitSlow);
        }

        self.age += 1;
        breakout
    }
}

impl Strategy for TurtleStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Donchian channel breakouts with a bull-market SMA filter"
    }

    fn preload(&mut self, candle: &Candle) {
        self.advance(candle);
    }

    fn update(&mut self, candle: &Candle) -> Option<Signal> {
        let breakout = self.advance(candle)?;
        if !self.bull_filter.is_ready() {
            return None;
        }
        if candle.close < self.bull_filter.value() {
            return Some(Signal::close_long());
        }
        if breakout.is_entry() {
            Some(Signal::open_long())
        } else {
            Some(Signal::close_long())
        }
    }
}

impl Checkpoint for TurtleStrategy {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            Self::NAME,
            &TurtleRecord {
                config: self.config.clone(),
                closes: self.closes.clone(),
                age: self.age,
                bull_filter: self.bull_filter.checkpoint()?,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: TurtleRecord = checkpoint::decode(Self::NAME, data)?;
        record.config.validate().map_err(|e| CheckpointError::Invalid {
            kind: Self::NAME,
            reason: e.to_string(),
        })?;
        if record.closes.capacity() != record.config.longest_channel() {
            return Err(CheckpointError::Invalid {
                kind: Self::NAME,
                reason: "close history does not match the longest channel".into(),
            });
        }

        let mut restored = Self::new(record.config);
        restored.bull_filter.restore(&record.bull_filter)?;
        restored.closes = record.closes;
        restored.age = record.age;
        *self = restored;
        Ok(())
    }
}
