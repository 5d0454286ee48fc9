//! Aldo divergence strategy.
//!
//! Compares price extremes with oscillator extremes over a short window.
//! A new price high the oscillator does not confirm opens a short; a new
//! price low with a diverging oscillator opens a long.

use quant_core::checkpoint::{self, lossless, Checkpoint};
use quant_core::error::{CheckpointError, StrategyError};
use quant_core::traits::{Indicator, Strategy, StrategyConfig};
use quant_core::types::{Candle, DebugProbe, Signal};
use quant_core::window::RingWindow;
use quant_indicators::{Cci, Macd, Rsi};
use serde::{Deserialize, Serialize};

/// Oscillator compared against price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorKind {
    Cci,
    Rsi,
    Macd,
}

impl OscillatorKind {
    /// Decode the numeric `oscillatorType` setting: 0 is CCI, 1 is RSI,
    /// anything else is MACD.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => OscillatorKind::Cci,
            1 => OscillatorKind::Rsi,
            _ => OscillatorKind::Macd,
        }
    }
}

/// Configuration for the Aldo strategy.
///
/// Only `period`, `oscillatorType` and the lengths of the selected
/// oscillator drive behavior. The remaining fields are accepted so existing
/// client configurations keep parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AldoConfig {
    pub trailing_stop_loss: f64,
    pub exit_bars: usize,
    pub rsi_length: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub stoch_length: usize,
    pub stoch_smooth_k: usize,
    pub stoch_smooth_d: usize,
    pub cci_length: usize,
    /// Divergence lookback window
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub oscillator_type: i32,
}

impl Default for AldoConfig {
    fn default() -> Self {
        Self {
            trailing_stop_loss: 3.5,
            exit_bars: 7,
            rsi_length: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stoch_length: 14,
            stoch_smooth_k: 3,
            stoch_smooth_d: 3,
            cci_length: 20,
            period: 5,
            overbought: 70.0,
            oversold: 30.0,
            oscillator_type: 0,
        }
    }
}

impl AldoConfig {
    pub fn oscillator(&self) -> OscillatorKind {
        OscillatorKind::from_code(self.oscillator_type)
    }
}

impl StrategyConfig for AldoConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Divergence period must be at least 1".into(),
            ));
        }
        let lengths_ok = match self.oscillator() {
            OscillatorKind::Cci => self.cci_length > 0,
            OscillatorKind::Rsi => self.rsi_length > 0,
            OscillatorKind::Macd => {
                self.macd_fast > 0 && self.macd_slow > 0 && self.macd_signal > 0
            }
        };
        if !lengths_ok {
            return Err(StrategyError::InvalidConfig(
                "Oscillator lengths must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Oscillator {
    Cci(Cci),
    Rsi(Rsi),
    Macd(Macd),
}

impl Oscillator {
    fn for_config(config: &AldoConfig) -> Self {
        match config.oscillator() {
            OscillatorKind::Cci => Oscillator::Cci(Cci::new(config.cci_length)),
            OscillatorKind::Rsi => Oscillator::Rsi(Rsi::new(config.rsi_length)),
            OscillatorKind::Macd => Oscillator::Macd(Macd::new(
                config.macd_fast,
                config.macd_slow,
                config.macd_signal,
            )),
        }
    }

    fn inner(&self) -> &dyn Indicator {
        match self {
            Oscillator::Cci(cci) => cci,
            Oscillator::Rsi(rsi) => rsi,
            Oscillator::Macd(macd) => macd,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Indicator {
        match self {
            Oscillator::Cci(cci) => cci,
            Oscillator::Rsi(rsi) => rsi,
            Oscillator::Macd(macd) => macd,
        }
    }
}

/// Most recent and previous extremes of price and oscillator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct Extrema {
    last_price_high: f64,
    prev_price_high: f64,
    last_price_low: f64,
    prev_price_low: f64,
    #[serde(with = "lossless")]
    last_osc_high: f64,
    #[serde(with = "lossless")]
    prev_osc_high: f64,
    #[serde(with = "lossless")]
    last_osc_low: f64,
    #[serde(with = "lossless")]
    prev_osc_low: f64,
}

/// Whether the current candle set a window extreme.
#[derive(Debug, Clone, Copy)]
struct Flags {
    price_high: bool,
    price_low: bool,
    osc_high: bool,
    osc_low: bool,
}

/// Aldo divergence strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct AldoStrategy {
    config: AldoConfig,
    oscillator: Oscillator,
    highs: RingWindow,
    lows: RingWindow,
    oscs: RingWindow,
    age: usize,
    extrema: Extrema,
}

#[derive(Serialize, Deserialize)]
struct AldoRecord {
    config: AldoConfig,
    oscillator: String,
    highs: RingWindow,
    lows: RingWindow,
    oscs: RingWindow,
    age: usize,
    extrema: Extrema,
}

impl AldoStrategy {
    pub const NAME: &'static str = "Aldo";

    /// Create a new Aldo strategy.
    pub fn new(config: AldoConfig) -> Self {
        Self {
            oscillator: Oscillator::for_config(&config),
            highs: RingWindow::new(config.period),
            lows: RingWindow::new(config.period),
            oscs: RingWindow::new(config.period),
            age: 0,
            extrema: Extrema::default(),
            config,
        }
    }

    pub fn config(&self) -> &AldoConfig {
        &self.config
    }

    fn flags(&self, candle: &Candle, osc: f64) -> Flags {
        Flags {
            price_high: candle.high >= self.highs.max(),
            price_low: candle.low <= self.lows.min(),
            osc_high: osc >= self.oscs.max(),
            osc_low: osc <= self.oscs.min(),
        }
    }

    fn advance(&mut self, candle: &Candle) -> Option<Signal> {
        self.oscillator.inner_mut().update(candle);
        let osc = self.oscillator.inner().value();
        let age = self.age as i64;
        self.highs.set(age, candle.high);
        self.lows.set(age, candle.low);
        self.oscs.set(age, osc);
        self.age += 1;
        if self.age < self.config.period {
            return None;
        }

        let flags = self.flags(candle, osc);
        let stored = self.extrema;

        // on a new extreme both last and prev take the current value
        let last_price_high = if flags.price_high { candle.high } else { stored.last_price_high };
        let prev_price_high = if flags.price_high { last_price_high } else { stored.prev_price_high };
        let last_osc_high = if flags.osc_high { osc } else { stored.last_osc_high };
        let prev_osc_high = if flags.osc_high { last_osc_high } else { stored.prev_osc_high };
        let last_price_low = if flags.price_low { candle.low } else { stored.last_price_low };
        let prev_price_low = if flags.price_low { last_price_low } else { stored.prev_price_low };
        let last_osc_low = if flags.osc_low { osc } else { stored.last_osc_low };
        let prev_osc_low = if flags.osc_low { last_osc_low } else { stored.prev_osc_low };

        let regular_bearish =
            flags.price_high && candle.high >= prev_price_high && osc <= prev_osc_high;
        let hidden_bearish =
            flags.price_high && candle.high <= prev_price_high && osc <= prev_osc_high;
        let regular_bullish =
            flags.price_low && candle.low <= prev_price_low && osc >= prev_osc_low;
        let hidden_bullish =
            flags.price_low && candle.low >= prev_price_low && osc <= prev_osc_low;

        self.extrema = Extrema {
            last_price_high,
            prev_price_high,
            last_price_low,
            prev_price_low,
            last_osc_high,
            prev_osc_high,
            last_osc_low,
            prev_osc_low,
        };

        if regular_bearish || hidden_bearish {
            Some(Signal::open_short())
        } else if regular_bullish || hidden_bullish {
            Some(Signal::open_long())
        } else {
            None
        }
    }
}

impl Strategy for AldoStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Trades price/oscillator divergences"
    }

    fn preload(&mut self, candle: &Candle) {
        self.advance(candle);
    }

    fn update(&mut self, candle: &Candle) -> Option<Signal> {
        self.advance(candle)
    }

    fn debug(&self, candle: &Candle) -> Vec<DebugProbe> {
        if self.age < self.config.period {
            return Vec::new();
        }
        let osc = self.oscillator.inner().value();
        let flags = self.flags(candle, osc);
        let e = &self.extrema;
        vec![
            DebugProbe::new("oscillator", 0, osc),
            DebugProbe::new("last_price_high", 1, e.last_price_high),
            DebugProbe::new("prev_price_high", 1, e.prev_price_high),
            DebugProbe::new("last_price_low", 1, e.last_price_low),
            DebugProbe::new("prev_price_low", 1, e.prev_price_low),
            DebugProbe::new("last_osc_high", 2, e.last_osc_high),
            DebugProbe::new("prev_osc_high", 2, e.prev_osc_high),
            DebugProbe::new("last_osc_low", 2, e.last_osc_low),
            DebugProbe::new("prev_osc_low", 2, e.prev_osc_low),
            DebugProbe::flag("price_high", 3, flags.price_high),
            DebugProbe::flag("price_low", 3, flags.price_low),
            DebugProbe::flag("osc_high", 3, flags.osc_high),
            DebugProbe::flag("osc_low", 3, flags.osc_low),
            DebugProbe::new("window_high", 4, self.highs.max()),
            DebugProbe::new("window_low", 4, self.lows.min()),
            DebugProbe::new("window_osc_high", 5, self.oscs.max()),
            DebugProbe::new("window_osc_low", 5, self.oscs.min()),
        ]
    }
}

impl Checkpoint for AldoStrategy {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            Self::NAME,
            &AldoRecord {
                config: self.config.clone(),
                oscillator: self.oscillator.inner().checkpoint()?,
                highs: self.highs.clone(),
                lows: self.lows.clone(),
                oscs: self.oscs.clone(),
                age: self.age,
                extrema: self.extrema,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: AldoRecord = checkpoint::decode(Self::NAME, data)?;
        record.config.validate().map_err(|e| CheckpointError::Invalid {
            kind: Self::NAME,
            reason: e.to_string(),
        })?;
        let period = record.config.period;
        if [&record.highs, &record.lows, &record.oscs]
            .iter()
            .any(|w| w.capacity() != period)
        {
            return Err(CheckpointError::Invalid {
                kind: Self::NAME,
                reason: "window length does not match the divergence period".into(),
            });
        }

        let mut restored = Self::new(record.config);
        restored.oscillator.inner_mut().restore(&record.oscillator)?;
        restored.highs = record.highs;
        restored.lows = record.lows;
        restored.oscs = record.oscs;
        restored.age = record.age;
        restored.extrema = record.extrema;
        *self = restored;
        Ok(())
    }
}
