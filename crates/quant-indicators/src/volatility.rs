//! Volatility indicators.

use quant_core::checkpoint::{self, Checkpoint};
use quant_core::error::CheckpointError;
use quant_core::traits::Indicator;
use quant_core::types::Candle;
use quant_core::window::RingWindow;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Average True Range (ATR).
///
/// Recomputed from the ring on every update: the range of the oldest slot
/// plus the true range of each following slot, divided by `period`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atr {
    period: usize,
    age: usize,
    highs: RingWindow,
    lows: RingWindow,
    closes: RingWindow,
    ready: bool,
    value: f64,
}

impl Atr {
    /// Create a new ATR with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            age: 0,
            highs: RingWindow::new(period),
            lows: RingWindow::new(period),
            closes: RingWindow::new(period),
            ready: false,
            value: 0.0,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// True range of the slot at `age` against the previous slot's close.
    fn true_range(&self, age: i64) -> f64 {
        let high = self.highs.get(age);
        let low = self.lows.get(age);
        let prev_close = self.closes.get(age - 1);

        let mut range = high - low;
        let high_gap = (high - prev_close).abs();
        let low_gap = (low - prev_close).abs();
        if high_gap > range {
            range = high_gap;
        }
        if low_gap > range {
            range = low_gap;
        }
        range
    }
}

impl Indicator for Atr {
    fn update(&mut self, candle: &Candle) {
        let age = self.age as i64;
        self.highs.set(age, candle.high);
        self.lows.set(age, candle.low);
        self.closes.set(age, candle.close);

        // age + 1 is the oldest slot
        let mut sum = self.highs.get(age + 1) - self.lows.get(age + 1);
        for i in 1..self.period as i64 {
            sum += self.true_range(age + i + 1);
        }
        self.value = sum / self.period as f64;

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
        "ATR"
    }
}

impl Checkpoint for Atr {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode("ATR", self)
    }

    /// A malformed checkpoint leaves the current state untouched.
    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        match checkpoint::decode::<Atr>("ATR", data) {
            Ok(state) => *self = state,
            Err(err) => warn!(error = %err, "ignoring malformed ATR checkpoint"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atr_constant_range() {
        let mut atr = Atr::new(3);
        for i in 0..5 {
            atr.update(&Candle::new(i, 10.0, 11.0, 9.0, 10.0, 0.0));
        }
        assert!(atr.is_ready());
        assert!((atr.value() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_ready_on_period() {
        let mut atr = Atr::new(4);
        for i in 0..4 {
            assert!(!atr.is_ready());
            atr.update(&Candle::new(i, 10.0, 11.0, 9.0, 10.0, 0.0));
        }
        assert!(atr.is_ready());
    }

    #[test]
    fn test_atr_uses_gap_from_previous_close() {
        let mut atr = Atr::new(2);
        atr.update(&Candle::new(0, 10.0, 10.5, 9.5, 10.0, 0.0));
        // gap up: |14 - 10| beats 14 - 13
        atr.update(&Candle::new(1, 13.0, 14.0, 13.0, 13.5, 0.0));
        // oldest slot range 1.0 plus true range 4.0
        assert!((atr.value() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_atr_period_one_is_range() {
        let mut atr = Atr::new(1);
        atr.update(&Candle::new(0, 5.0, 8.0, 4.0, 6.0, 0.0));
        assert!(atr.is_ready());
        assert_eq!(atr.value(), 4.0);
    }

    #[test]
    fn test_atr_malformed_checkpoint_keeps_state() {
        let mut atr = Atr::new(2);
        atr.update(&Candle::new(0, 10.0, 12.0, 9.0, 11.0, 0.0));
        let before = atr.clone();
        assert!(atr.restore("{\"period\":\"x\"}").is_ok());
        assert_eq!(atr, before);

        let saved = before.checkpoint().unwrap();
        let mut fresh = Atr::new(5);
        fresh.restore(&saved).unwrap();
        assert_eq!(fresh, before);
    }
}
