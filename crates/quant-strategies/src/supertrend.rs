//! SuperTrend Strategy.
//!
//! Builds ATR bands around the candle midpoint and follows whichever band
//! the close sits on. Goes long when the close is above the SuperTrend line,
//! protected by a percentage trailing stop, and flips short when the close
//! falls below it.

use quant_core::checkpoint::{self, Checkpoint};
use quant_core::error::{CheckpointError, StrategyError};
use quant_core::traits::{Indicator, Strategy, StrategyConfig};
use quant_core::types::{Candle, DebugProbe, Signal, SignalKind};
use quant_indicators::Atr;
use serde::{Deserialize, Serialize};

use crate::stop_loss::TrailingStopLoss;

/// Configuration for the SuperTrend strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuperTrendConfig {
    /// ATR period, also the warmup length
    pub atr_period: usize,
    /// Band distance from the midpoint in ATRs
    pub band_factor: f64,
    /// Trailing stop distance in percent
    pub trailing_stop: f64,
    /// Scales the band distance into a signal confidence
    pub confidence_multiplier: f64,
    /// Minimum confidence gain required to repeat an openLong
    pub confidence_bias: f64,
}

impl Default for SuperTrendConfig {
    fn default() -> Self {
        Self {
            atr_period: 7,
            band_factor: 3.0,
            trailing_stop: 3.5,
            confidence_multiplier: 20.0,
            confidence_bias: 0.1,
        }
    }
}

impl StrategyConfig for SuperTrendConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.atr_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "ATR period must be at least 1".into(),
            ));
        }
        if !(0.0..100.0).contains(&self.trailing_stop) {
            return Err(StrategyError::InvalidConfig(
                "Trailing stop must be between 0 and 100 percent".into(),
            ));
        }
        if self.band_factor < 0.0 || self.confidence_multiplier < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Band factor and confidence multiplier must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Band values for one active tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct Bands {
    upper_basic: f64,
    lower_basic: f64,
    upper: f64,
    lower: f64,
    /// The SuperTrend line: one of the bands, or 0 when neither case applies
    line: f64,
}

/// SuperTrend Strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperTrendStrategy {
    config: SuperTrendConfig,
    atr: Atr,
    stop_loss: TrailingStopLoss,
    bands: Bands,
    last_close: f64,
    age: usize,
    confidence: f64,
    last_buy_confidence: f64,
}

#[derive(Serialize, Deserialize)]
struct SuperTrendRecord {
    config: SuperTrendConfig,
    bands: Bands,
    last_close: f64,
    age: usize,
    confidence: f64,
    last_buy_confidence: f64,
    stop_loss: String,
    atr: String,
}

impl SuperTrendStrategy {
    pub const NAME: &'static str = "SuperTrend";

    /// Create a new SuperTrend strategy.
    pub fn new(config: SuperTrendConfig) -> Self {
        let atr = Atr::new(config.atr_period);
        let stop_loss = TrailingStopLoss::new(config.trailing_stop);
        Self {
            config,
            atr,
            stop_loss,
            bands: Bands::default(),
            last_close: 0.0,
            age: 0,
            confidence: 0.0,
            last_buy_confidence: 0.0,
        }
    }

    pub fn config(&self) -> &SuperTrendConfig {
        &self.config
    }

    /// Current SuperTrend line.
    pub fn line(&self) -> f64 {
        self.bands.line
    }

    /// Advance ATR and band state. Returns false while warming up.
    fn advance(&mut self, candle: &Candle) -> bool {
        self.atr.update(candle);
        self.age += 1;
        if self.age < self.config.atr_period {
            return false;
        }

        let close = candle.close;
        let last = self.bands;
        let offset = self.atr.value() * self.config.band_factor;
        let upper_basic = candle.midpoint() + offset;
        let lower_basic = candle.midpoint() - offset;

        let upper = if upper_basic < last.upper || self.last_close > last.upper {
            upper_basic
        } else {
            last.upper
        };
        let lower = if lower_basic > last.lower || self.last_close < last.lower {
            lower_basic
        } else {
            last.lower
        };

        let line = if last.line == last.upper && close <= upper {
            self.confidence = (upper - close) / close;
            upper
        } else if last.line == last.upper && close >= upper {
            self.confidence = (close - lower) / close;
            lower
        } else if last.line == last.lower && close >= lower {
            self.confidence = (close - lower) / close;
            lower
        } else if last.line == last.lower && close <= lower {
            self.confidence = (upper - close) / close;
            upper
        } else {
            0.0
        };

        self.bands = Bands {
            upper_basic,
            lower_basic,
            upper,
            lower,
            line,
        };
        self.last_close = close;
        true
    }
}

impl Strategy for SuperTrendStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Follows ATR SuperTrend bands with a trailing stop"
    }

    fn preload(&mut self, candle: &Candle) {
        self.advance(candle);
    }

    fn update(&mut self, candle: &Candle) -> Option<Signal> {
        if !self.advance(candle) {
            return None;
        }
        let close = candle.close;

        if self.stop_loss.is_triggered(close) {
            self.stop_loss.end();
            self.last_buy_confidence = 0.0;
            return Some(Signal::close_long());
        }

        if close > self.bands.line {
            self.stop_loss.begin(close);
            let confidence = (self.confidence * self.config.confidence_multiplier).min(1.0);
            if confidence - self.last_buy_confidence < self.config.confidence_bias {
                return None;
            }
            self.last_buy_confidence = confidence;
            return Some(Signal::new(SignalKind::OpenLong, confidence));
        }

        if close < self.bands.line {
            self.stop_loss.end();
            self.last_buy_confidence = 0.0;
            return Some(Signal::open_short());
        }

        None
    }

    fn debug(&self, _candle: &Candle) -> Vec<DebugProbe> {
        vec![
            DebugProbe::new("supertrend", 0, self.bands.line),
            DebugProbe::new("atr", 1, self.atr.value()),
            DebugProbe::new("confidence", 2, self.confidence),
        ]
    }
}

impl Checkpoint for SuperTrendStrategy {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            Self::NAME,
            &SuperTrendRecord {
                config: self.config.clone(),
                bands: self.bands,
                last_close: self.last_close,
                age: self.age,
                confidence: self.confidence,
                last_buy_confidence: self.last_buy_confidence,
                stop_loss: self.stop_loss.checkpoint()?,
                atr: self.atr.checkpoint()?,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: SuperTrendRecord = checkpoint::decode(Self::NAME, data)?;
        record.config.validate().map_err(|e| CheckpointError::Invalid {
            kind: Self::NAME,
            reason: e.to_string(),
        })?;

        let mut restored = Self::new(record.config);
        restored.stop_loss.restore(&record.stop_loss)?;
        restored.atr.restore(&record.atr)?;
        restored.bands = record.bands;
        restored.last_close = record.last_close;
        restored.age = record.age;
        restored.confidence = record.confidence;
        restored.last_buy_confidence = record.last_buy_confidence;
        *self = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{candles, wave};

    fn fast_config() -> SuperTrendConfig {
        SuperTrendConfig {
            atr_period: 3,
            ..Default::default()
        }
    }

    fn run(strategy: &mut SuperTrendStrategy, candles: &[Candle]) -> Vec<Option<Signal>> {
        candles.iter().map(|c| strategy.update(c)).collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(SuperTrendConfig::default().validate().is_ok());

        let config = SuperTrendConfig {
            atr_period: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SuperTrendConfig {
            trailing_stop: 100.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_accepts_partial_json() {
        let config: SuperTrendConfig = serde_json::from_str(r#"{"atrPeriod":10}"#).unwrap();
        assert_eq!(config.atr_period, 10);
        assert_eq!(config.band_factor, 3.0);
    }

    #[test]
    fn test_silent_during_warmup() {
        let mut strategy = SuperTrendStrategy::new(SuperTrendConfig::default());
        let signals = run(&mut strategy, &candles(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]));
        assert!(signals.iter().all(Option::is_none));
    }

    #[test]
    fn test_long_then_stop_then_short() {
        let mut closes: Vec<f64> = (100..=110).map(f64::from).collect();
        closes.extend([90.0, 89.0]);
        let mut strategy = SuperTrendStrategy::new(fast_config());
        let signals = run(&mut strategy, &candles(&closes));

        assert_eq!(signals[2], Some(Signal::new(SignalKind::OpenLong, 1.0)));
        // repeated longs are suppressed by the confidence bias
        assert!(signals[3..11].iter().all(Option::is_none));
        assert_eq!(signals[11], Some(Signal::close_long()));
        assert_eq!(signals[12], Some(Signal::open_short()));
    }

    #[test]
    fn test_preload_never_signals() {
        let data = candles(&wave(120));
        let mut preloaded = SuperTrendStrategy::new(fast_config());
        let mut updated = SuperTrendStrategy::new(fast_config());
        for candle in &data {
            preloaded.preload(candle);
            updated.update(candle);
        }
        assert_eq!(preloaded.line(), updated.line());
        assert_eq!(preloaded.atr, updated.atr);
    }

    #[test]
    fn test_resume_matches_full_replay() {
        let data = candles(&wave(300));
        let mut full = SuperTrendStrategy::new(fast_config());
        let expected = run(&mut full, &data);

        let mut first = SuperTrendStrategy::new(fast_config());
        let mut signals = run(&mut first, &data[..150]);
        let saved = first.checkpoint().unwrap();

        let mut resumed = SuperTrendStrategy::new(SuperTrendConfig::default());
        resumed.restore(&saved).unwrap();
        assert_eq!(resumed, first);
        signals.extend(run(&mut resumed, &data[150..]));

        assert_eq!(signals, expected);
        assert_eq!(resumed.checkpoint().unwrap(), full.checkpoint().unwrap());
    }

    #[test]
    fn test_debug_probes() {
        let mut strategy = SuperTrendStrategy::new(fast_config());
        let data = candles(&[100.0, 101.0, 102.0]);
        run(&mut strategy, &data);
        let probes = strategy.debug(&data[2]);
        let names: Vec<_> = probes.iter().map(|p| (p.name.as_str(), p.index)).collect();
        assert_eq!(names, vec![("supertrend", 0), ("atr", 1), ("confidence", 2)]);
        assert!((probes[1].value - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_malformed_checkpoint_fails() {
        let mut strategy = SuperTrendStrategy::new(fast_config());
        assert!(strategy.restore("{\"config\":").is_err());
        assert_eq!(strategy, SuperTrendStrategy::new(fast_config()));
    }
}
