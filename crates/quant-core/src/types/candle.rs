//! Candle (OHLCV) market data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Interval;

/// One closed kline for a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Market identifier
    #[serde(default)]
    pub market: u32,
    /// Symbol identifier within the market
    #[serde(default)]
    pub symbol_id: u32,
    /// Kline interval
    #[serde(default)]
    pub interval: Interval,
    /// Open time as Unix milliseconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Create a candle with default market, symbol and interval.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            ..Default::default()
        }
    }

    /// Synthetic candle carrying only a close.
    ///
    /// Used when one indicator feeds a derived series into another.
    #[inline]
    pub fn from_close(close: f64) -> Self {
        Self {
            close,
            ..Default::default()
        }
    }

    /// Stamp the candle with its market, symbol and interval.
    pub fn with_source(mut self, market: u32, symbol_id: u32, interval: Interval) -> Self {
        self.market = market;
        self.symbol_id = symbol_id;
        self.interval = interval;
        self
    }

    /// Typical price (HLC average).
    #[inline]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Midpoint of the range (HL average).
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Open time truncated to whole seconds, in milliseconds.
    #[inline]
    pub fn timestamp_secs_ms(&self) -> i64 {
        self.timestamp.div_euclid(1000) * 1000
    }

    /// Open time as a DateTime, if representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_helpers() {
        let candle = Candle::new(0, 10.0, 12.0, 6.0, 9.0, 100.0);
        assert!((candle.typical_price() - 9.0).abs() < 1e-10);
        assert!((candle.midpoint() - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_from_close() {
        let candle = Candle::from_close(3.5);
        assert_eq!(candle.close, 3.5);
        assert_eq!(candle.high, 0.0);
        assert_eq!(candle.timestamp, 0);
    }

    #[test]
    fn test_timestamp_truncation() {
        let candle = Candle::new(1_700_000_000_999, 1.0, 1.0, 1.0, 1.0, 0.0);
        assert_eq!(candle.timestamp_secs_ms(), 1_700_000_000_000);
        assert!(candle.datetime().is_some());
    }

    #[test]
    fn test_wire_format() {
        let candle = Candle::new(60_000, 1.0, 2.0, 0.5, 1.5, 10.0).with_source(1, 42, Interval::Hour1);
        let json = serde_json::to_string(&candle).unwrap();
        assert!(json.contains("\"symbolId\":42"));
        assert!(json.contains("\"interval\":\"1h\""));

        let minimal: Candle =
            serde_json::from_str(r#"{"timestamp":1,"open":1,"high":2,"low":0.5,"close":1.5}"#).unwrap();
        assert_eq!(minimal.interval, Interval::Minute1);
        assert_eq!(minimal.volume, 0.0);
    }
}
