//! Percentage trailing stop for long positions.

use quant_core::checkpoint::{self, Checkpoint};
use quant_core::error::CheckpointError;
use serde::{Deserialize, Serialize};

/// Stop placed a fixed percentage below the price it was begun at.
///
/// Re-beginning at a higher price trails the stop upward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopLoss {
    percentage: f64,
    reference_price: f64,
    stop_price: f64,
    active: bool,
}

impl TrailingStopLoss {
    pub fn new(percentage: f64) -> Self {
        Self {
            percentage,
            reference_price: 0.0,
            stop_price: 0.0,
            active: false,
        }
    }

    /// Arm the stop below `price`.
    pub fn begin(&mut self, price: f64) {
        self.reference_price = price;
        self.stop_price = (100.0 - self.percentage) / 100.0 * price;
        self.active = true;
    }

    /// Disarm the stop.
    pub fn end(&mut self) {
        self.reference_price = 0.0;
        self.stop_price = 0.0;
        self.active = false;
    }

    pub fn is_triggered(&self, price: f64) -> bool {
        self.active && self.stop_price > price
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stop_price(&self) -> f64 {
        self.stop_price
    }
}

impl Checkpoint for TrailingStopLoss {
    fn checkpoint(&self) -> Result<String, CheckpointError> {
        checkpoint::encode("TrailingStopLoss", self)
    }

    fn restore(&mut self, data: &str) -> Result<(), CheckpointError> {
        *self = checkpoint::decode("TrailingStopLoss", data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_never_triggers() {
        let stop = TrailingStopLoss::new(5.0);
        assert!(!stop.is_triggered(0.0));
    }

    #[test]
    fn test_begin_and_trigger() {
        let mut stop = TrailingStopLoss::new(5.0);
        stop.begin(100.0);
        assert!((stop.stop_price() - 95.0).abs() < 1e-10);
        assert!(!stop.is_triggered(96.0));
        assert!(stop.is_triggered(94.0));
    }

    #[test]
    fn test_rebegin_trails_upward() {
        let mut stop = TrailingStopLoss::new(10.0);
        stop.begin(100.0);
        stop.begin(200.0);
        assert!(stop.is_triggered(170.0));
        stop.end();
        assert!(!stop.is_active());
        assert!(!stop.is_triggered(1.0));
    }

    #[test]
    fn test_checkpoint_round_trip() {
        let mut stop = TrailingStopLoss::new(3.5);
        stop.begin(123.4);
        let mut restored = TrailingStopLoss::new(1.0);
        restored.restore(&stop.checkpoint().unwrap()).unwrap();
        assert_eq!(restored, stop);
        assert!(restored.restore("null").is_err());
    }
}
