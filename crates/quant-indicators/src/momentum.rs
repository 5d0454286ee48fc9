//! Momentum indicators.

use quant_core::checkpoint::{self, lossless, Checkpoint};
use quant_core::error::CheckpointError;
use quant_core::traits::Indicator;
use quant_core::types::Candle;
use quant_core::window::RingWindow;
use serde::{Deserialize, Serialize};

use crate::moving_average::{Ema, Smma};

/// Relative Strength Index (RSI) with Wilder smoothing.
///
/// The first candle only seeds the previous price. Readiness is latched at
/// the start of a tick once both smoothed averages were already ready, so it
/// trails the averages by one candle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rsi {
    period: usize,
    last_price: Option<f64>,
    avg_up: Smma,
    avg_down: Smma,
    ready: bool,
    value: f64,
}

#[derive(Serialize, Deserialize)]
struct RsiRecord {
    period: usize,
    ready: bool,
    value: f64,
    last_price: Option<f64>,
    avg_up: String,
    avg_down: String,
}

impl Rsi {
    /// Create a new RSI with the specified period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            last_price: None,
            avg_up: Smma::new(period),
            avg_down: Smma::new(period),
            ready: false,
            value: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn update(&mut self, candle: &Candle) {
        let price = candle.close;
        let Some(last) = self.last_price else {
            self.last_price = Some(price);
            return;
        };

        if !self.ready && self.avg_up.is_ready() && self.avg_down.is_ready() {
            self.ready = true;
        }

        let (up, down) = if price > last {
            (price - last, 0.0)
        } else if price < last {
            (0.0, last - price)
        } else {
            (0.0, 0.0)
        };
        self.avg_up.update(&Candle::from_close(up));
        self.avg_down.update(&Candle::from_close(down));

        let avg_up = self.avg_up.value();
        let avg_down = self.avg_down.value();
        let rs = avg_up / if avg_down == 0.0 { 1.0 } else { avg_down };
        self.value = 100.0 - 100.0 / (1.0 + rs);

        if avg_down == 0.0 && avg_up != 0.0 {
            self.value = 100.0;
        } else if avg_down == 0.0 {
            self.value = 0.0;
        }

        self.last_price = Some(price);
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

impl Checkpoint for Rsi {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            "RSI",
            &RsiRecord {
                period: self.period,
                ready: self.ready,
                value: self.value,
                last_price: self.last_price,
                avg_up: self.avg_up.checkpoint()?,
                avg_down: self.avg_down.checkpoint()?,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: RsiRecord = checkpoint::decode("RSI", data)?;
        let mut restored = self.clone();
        restored.avg_up.restore(&record.avg_up)?;
        restored.avg_down.restore(&record.avg_down)?;
        restored.period = record.period;
        restored.ready = record.ready;
        restored.value = record.value;
        restored.last_price = record.last_price;
        *self = restored;
        Ok(())
    }
}

/// Commodity Channel Index (CCI).
///
/// `(typical - mean) / (constant * mean_abs_deviation)` over the last
/// `period` typical prices. The division is unguarded: a flat window yields
/// NaN or an infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cci {
    period: usize,
    constant: f64,
    age: usize,
    typicals: RingWindow,
    ready: bool,
    #[serde(with = "lossless")]
    value: f64,
}

impl Cci {
    pub const DEFAULT_CONSTANT: f64 = 0.015;

    /// Create a new CCI with the standard 0.015 constant.
    pub fn new(period: usize) -> Self {
        Self::with_constant(period, Self::DEFAULT_CONSTANT)
    }

    pub fn with_constant(period: usize, constant: f64) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            constant,
            age: 0,
            typicals: RingWindow::new(period),
            ready: false,
            value: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Cci {
    fn update(&mut self, candle: &Candle) {
        let typical = candle.typical_price();
        self.typicals.set(self.age as i64, typical);
        if self.age + 1 < self.period {
            self.age += 1;
            return;
        }

        self.ready = true;
        let mean = self.typicals.mean();
        let deviation =
            self.typicals.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / self.period as f64;
        self.value = (typical - mean) / (self.constant * deviation);
        self.age += 1;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "CCI"
    }
}

impl Checkpoint for Cci {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode("CCI", self)
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        *self = checkpoint::decode("CCI", data)?;
        Ok(())
    }
}

/// Moving Average Convergence Divergence (MACD) histogram.
///
/// `value` is the MACD line minus its signal EMA.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    ready: bool,
    value: f64,
}

#[derive(Serialize, Deserialize)]
struct MacdRecord {
    ready: bool,
    value: f64,
    fast: String,
    slow: String,
    signal: String,
}

impl Macd {
    /// Create a new MACD with the specified periods.
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast: Ema::new(fast_period),
            slow: Ema::new(slow_period),
            signal: Ema::new(signal_period),
            ready: false,
            value: 0.0,
        }
    }

    /// Create MACD with the standard 12/26/9 periods.
    pub fn standard() -> Self {
        Self::new(12, 26, 9)
    }

    /// Current signal line value.
    pub fn signal_line(&self) -> f64 {
        self.signal.value()
    }
}

impl Indicator for Macd {
    fn update(&mut self, candle: &Candle) {
        self.fast.update(candle);
        self.slow.update(candle);
        let diff = self.fast.value() - self.slow.value();
        self.signal.update(&Candle::from_close(diff));
        self.value = diff - self.signal.value();
        self.ready = true;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

impl Checkpoint for Macd {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            "MACD",
            &MacdRecord {
                ready: self.ready,
                value: self.value,
                fast: self.fast.checkpoint()?,
                slow: self.slow.checkpoint()?,
                signal: self.signal.checkpoint()?,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: MacdRecord = checkpoint::decode("MACD", data)?;
        let mut restored = self.clone();
        restored.fast.restore(&record.fast)?;
        restored.slow.restore(&record.slow)?;
        restored.signal.restore(&record.signal)?;
        restored.ready = record.ready;
        restored.value = record.value;
        *self = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<I: Indicator>(indicator: &mut I, closes: &[f64]) {
        for &close in closes {
            indicator.update(&Candle::from_close(close));
        }
    }

    fn flat(price: f64) -> Candle {
        Candle::new(0, price, price, price, price, 0.0)
    }

    #[test]
    fn test_rsi_rising_prices() {
        let mut rsi = Rsi::new(5);
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        feed(&mut rsi, &closes);
        assert!(rsi.is_ready());
        assert_eq!(rsi.value(), 100.0);
    }

    #[test]
    fn test_rsi_falling_prices() {
        let mut rsi = Rsi::new(5);
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        feed(&mut rsi, &closes);
        assert!(rsi.is_ready());
        assert_eq!(rsi.value(), 0.0);
    }

    #[test]
    fn test_rsi_readiness_lags_averages() {
        let mut rsi = Rsi::new(3);
        // one seed tick, then the averages need period + 1 updates
        feed(&mut rsi, &[1.0, 2.0, 1.0, 2.0, 1.0]);
        assert!(!rsi.is_ready());
        feed(&mut rsi, &[2.0]);
        assert!(rsi.is_ready());
    }

    #[test]
    fn test_rsi_balanced_moves() {
        let mut rsi = Rsi::new(2);
        feed(&mut rsi, &[10.0, 11.0, 10.0]);
        // averages: up 1/2, down 1/2
        assert!((rsi.value() - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_rsi_checkpoint_round_trip() {
        let mut rsi = Rsi::new(4);
        feed(&mut rsi, &[5.0, 6.0, 4.0, 7.0, 7.0, 3.0, 8.0]);
        let mut restored = Rsi::new(14);
        restored.restore(&rsi.checkpoint().unwrap()).unwrap();
        assert_eq!(restored, rsi);
        assert!(restored.restore("[]").is_err());
        assert_eq!(restored, rsi);
    }

    #[test]
    fn test_cci_known_value() {
        let mut cci = Cci::new(3);
        cci.update(&flat(1.0));
        cci.update(&flat(2.0));
        assert!(!cci.is_ready());
        cci.update(&flat(3.0));
        assert!(cci.is_ready());
        // mean 2, mean deviation 2/3
        assert!((cci.value() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cci_flat_window_is_nan_and_round_trips() {
        let mut cci = Cci::new(2);
        cci.update(&flat(5.0));
        cci.update(&flat(5.0));
        assert!(cci.value().is_nan());

        let saved = cci.checkpoint().unwrap();
        let mut restored = Cci::new(7);
        restored.restore(&saved).unwrap();
        assert!(restored.value().is_nan());
        assert_eq!(restored.checkpoint().unwrap(), saved);
    }

    #[test]
    fn test_macd_first_update_is_zero() {
        let mut macd = Macd::standard();
        macd.update(&Candle::from_close(50.0));
        assert!(macd.is_ready());
        assert_eq!(macd.value(), 0.0);
        assert_eq!(macd.signal_line(), 0.0);
    }

    #[test]
    fn test_macd_tracks_trend() {
        let mut macd = Macd::new(3, 6, 3);
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + 2.0 * i as f64).collect();
        feed(&mut macd, &closes);
        // fast EMA above slow in an uptrend, histogram converges toward zero
        assert!(macd.signal_line() > 0.0);
        assert!(macd.value().abs() < macd.signal_line());
    }

    #[test]
    fn test_macd_checkpoint_round_trip() {
        let mut macd = Macd::new(3, 5, 2);
        feed(&mut macd, &[1.0, 3.0, 2.0, 5.0, 4.0]);
        let mut restored = Macd::standard();
        restored.restore(&macd.checkpoint().unwrap()).unwrap();
        assert_eq!(restored, macd);

        feed(&mut macd, &[6.0]);
        feed(&mut restored, &[6.0]);
        assert_eq!(restored.value().to_bits(), macd.value().to_bits());
    }
}
