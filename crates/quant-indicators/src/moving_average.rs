//! Moving average indicators.

use quant_core::checkpoint::{self, Checkpoint};
use quant_core::error::CheckpointError;
use quant_core::traits::Indicator;
use quant_core::types::Candle;
use quant_core::window::RingWindow;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Simple Moving Average (SMA) of closes.
///
/// Keeps a running sum over a ring of the last `period` closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sma {
    period: usize,
    age: usize,
    sum: f64,
    closes: RingWindow,
    ready: bool,
    value: f64,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            age: 0,
            sum: 0.0,
            closes: RingWindow::new(period),
            ready: false,
            value: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn update(&mut self, candle: &Candle) {
        let evicted = self.closes.replace(self.age as i64, candle.close);
        self.sum += candle.close - evicted;
        self.value = self.sum / self.period as f64;
        if !self.ready && self.age + 1 >= self.period {
            self.ready = true;
        }
        self.age += 1;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

impl Checkpoint for Sma {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode("SMA", self)
    }

    /// A malformed checkpoint leaves the current state untouched.
    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        match checkpoint::decode::<Sma>("SMA", data) {
            Ok(state) => *self = state,
            Err(err) => warn!(error = %err, "ignoring malformed SMA checkpoint"),
        }
        Ok(())
    }
}

/// Exponential Moving Average (EMA).
///
/// Seeds with the first close, then applies `k = 2 / (period + 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ema {
    period: usize,
    ready: bool,
    value: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            ready: false,
            value: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn update(&mut self, candle: &Candle) {
        if !self.ready {
            self.value = candle.close;
            self.ready = true;
            return;
        }
        let k = 2.0 / (self.period as f64 + 1.0);
        self.value = candle.close * k + self.value * (1.0 - k);
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

impl Checkpoint for Ema {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode("EMA", self)
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        *self = checkpoint::decode("EMA", data)?;
        Ok(())
    }
}

/// Smoothed Moving Average (SMMA, Wilder's smoothing).
///
/// Follows an inner SMA for the first `period` updates, then switches to
/// `(value * (period - 1) + close) / period`.
#[derive(Debug, Clone, PartialEq)]
pub struct Smma {
    period: usize,
    age: usize,
    sma: Sma,
    ready: bool,
    value: f64,
}

#[derive(Serialize, Deserialize)]
struct SmmaRecord {
    period: usize,
    age: usize,
    ready: bool,
    value: f64,
    sma: String,
}

impl Smma {
    /// Create a new SMMA with the specified period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            age: 0,
            sma: Sma::new(period),
            ready: false,
            value: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Smma {
    fn update(&mut self, candle: &Candle) {
        self.age += 1;
        if self.age <= self.period {
            self.sma.update(candle);
            self.value = self.sma.value();
        } else {
            self.value =
                (self.value * (self.period - 1) as f64 + candle.close) / self.period as f64;
            self.ready = true;
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn name(&self) -> &str {
        "SMMA"
    }
}

impl Checkpoint for Smma {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode(
            "SMMA",
            &SmmaRecord {
                period: self.period,
                age: self.age,
                ready: self.ready,
                value: self.value,
                sma: self.sma.checkpoint()?,
            },
        )
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        let record: SmmaRecord = checkpoint::decode("SMMA", data)?;
        if record.period == 0 {
            return Err(CheckpointError::Invalid {
                kind: "SMMA",
                reason: "period must be greater than 0".into(),
            });
        }
        let mut sma = Sma::new(record.period);
        sma.restore(&record.sma)?;
        *self = Self {
            period: record.period,
            age: record.age,
            sma,
            ready: record.ready,
            value: record.value,
        };
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

    #[test]
    fn test_sma_constant_series() {
        let mut sma = Sma::new(4);
        for i in 0..4 {
            assert!(!sma.is_ready());
            sma.update(&Candle::from_close(7.5));
            assert_eq!(sma.is_ready(), i == 3);
        }
        assert!((sma.value() - 7.5).abs() < 1e-10);
    }

    #[test]
    fn test_sma_sliding_window() {
        let mut sma = Sma::new(3);
        feed(&mut sma, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((sma.value() - 4.0).abs() < 1e-10);
        feed(&mut sma, &[10.0]);
        assert!((sma.value() - 19.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_sma_malformed_checkpoint_keeps_state() {
        let mut sma = Sma::new(3);
        feed(&mut sma, &[1.0, 2.0, 3.0]);
        let before = sma.clone();
        assert!(sma.restore("not json").is_ok());
        assert_eq!(sma, before);
    }

    #[test]
    fn test_sma_checkpoint_round_trip() {
        let mut sma = Sma::new(5);
        feed(&mut sma, &[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0]);
        let mut restored = Sma::new(2);
        restored.restore(&sma.checkpoint().unwrap()).unwrap();
        assert_eq!(restored, sma);
    }

    #[test]
    fn test_ema_first_update_seeds() {
        let mut ema = Ema::new(10);
        assert!(!ema.is_ready());
        ema.update(&Candle::from_close(42.0));
        assert!(ema.is_ready());
        assert_eq!(ema.value(), 42.0);
    }

    #[test]
    fn test_ema_smoothing() {
        let mut ema = Ema::new(3);
        feed(&mut ema, &[10.0, 20.0]);
        // k = 0.5
        assert!((ema.value() - 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_ema_malformed_checkpoint_fails() {
        let mut ema = Ema::new(3);
        assert!(ema.restore("{\"period\":").is_err());
    }

    #[test]
    fn test_smma_follows_sma_then_smooths() {
        let mut smma = Smma::new(3);
        feed(&mut smma, &[3.0, 6.0, 9.0]);
        assert!(!smma.is_ready());
        assert!((smma.value() - 6.0).abs() < 1e-10);

        smma.update(&Candle::from_close(12.0));
        assert!(smma.is_ready());
        assert!((smma.value() - (6.0 * 2.0 + 12.0) / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_smma_checkpoint_round_trip() {
        let mut smma = Smma::new(4);
        feed(&mut smma, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let saved = smma.checkpoint().unwrap();
        let mut restored = Smma::new(9);
        restored.restore(&saved).unwrap();
        assert_eq!(restored, smma);

        feed(&mut smma, &[7.0]);
        feed(&mut restored, &[7.0]);
        assert_eq!(restored.value().to_bits(), smma.value().to_bits());
    }
}
