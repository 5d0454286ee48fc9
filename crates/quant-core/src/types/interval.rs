//! Kline interval definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Candle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Interval {
    #[serde(rename = "1m")]
    #[default]
    Minute1,
    #[serde(rename = "3m")]
    Minute3,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "6h")]
    Hour6,
    #[serde(rename = "8h")]
    Hour8,
    #[serde(rename = "12h")]
    Hour12,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "3d")]
    Day3,
    #[serde(rename = "1w")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
}

impl Interval {
    /// Duration in seconds. Months are approximated as 30 days.
    pub fn as_secs(&self) -> u64 {
        match self {
            Interval::Minute1 => 60,
            Interval::Minute3 => 180,
            Interval::Minute5 => 300,
            Interval::Minute15 => 900,
            Interval::Minute30 => 1_800,
            Interval::Hour1 => 3_600,
            Interval::Hour2 => 7_200,
            Interval::Hour4 => 14_400,
            Interval::Hour6 => 21_600,
            Interval::Hour8 => 28_800,
            Interval::Hour12 => 43_200,
            Interval::Day1 => 86_400,
            Interval::Day3 => 259_200,
            Interval::Week1 => 604_800,
            Interval::Month1 => 2_592_000,
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.as_secs() * 1000
    }

    pub fn all() -> &'static [Interval] {
        &[
            Interval::Minute1,
            Interval::Minute3,
            Interval::Minute5,
            Interval::Minute15,
            Interval::Minute30,
            Interval::Hour1,
            Interval::Hour2,
            Interval::Hour4,
            Interval::Hour6,
            Interval::Hour8,
            Interval::Hour12,
            Interval::Day1,
            Interval::Day3,
            Interval::Week1,
            Interval::Month1,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            Interval::Minute1 => "1m",
            Interval::Minute3 => "3m",
            Interval::Minute5 => "5m",
            Interval::Minute15 => "15m",
            Interval::Minute30 => "30m",
            Interval::Hour1 => "1h",
            Interval::Hour2 => "2h",
            Interval::Hour4 => "4h",
            Interval::Hour6 => "6h",
            Interval::Hour8 => "8h",
            Interval::Hour12 => "12h",
            Interval::Day1 => "1d",
            Interval::Day3 => "3d",
            Interval::Week1 => "1w",
            Interval::Month1 => "1M",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" (month) and "1m" (minute) differ only by case
        if let Some(interval) = Interval::all().iter().find(|i| i.label() == s) {
            return Ok(*interval);
        }
        match s.to_lowercase().as_str() {
            "1min" | "minute" => Ok(Interval::Minute1),
            "1hour" | "hour" => Ok(Interval::Hour1),
            "day" | "daily" => Ok(Interval::Day1),
            "week" | "weekly" => Ok(Interval::Week1),
            "month" | "monthly" => Ok(Interval::Month1),
            _ => Err(DataError::InvalidInterval(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_duration() {
        assert_eq!(Interval::Minute1.as_secs(), 60);
        assert_eq!(Interval::Hour4.as_millis(), 14_400_000);
        assert_eq!(Interval::Day1.as_secs(), 86_400);
    }

    #[test]
    fn test_interval_parse() {
        assert_eq!(Interval::from_str("1m").unwrap(), Interval::Minute1);
        assert_eq!(Interval::from_str("1M").unwrap(), Interval::Month1);
        assert_eq!(Interval::from_str("daily").unwrap(), Interval::Day1);
        assert!(Interval::from_str("7m").is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        for interval in Interval::all() {
            let json = serde_json::to_string(interval).unwrap();
            assert_eq!(json, format!("\"{}\"", interval));
        }
    }
}
