//! CSV candle source.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use quant_core::error::DataError;
use quant_core::types::{Candle, Interval};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "timestamp",
        alias = "Timestamp",
        alias = "time",
        alias = "open_time"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// OHLCV candles read from a CSV file, sorted by open time.
#[derive(Debug, Clone)]
pub struct CsvCandleSource {
    path: PathBuf,
    market: u32,
    symbol_id: u32,
    interval: Interval,
}

impl CsvCandleSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
            market: 0,
            symbol_id: 0,
            interval: Interval::default(),
        })
    }

    /// Stamp every loaded candle with this market, symbol and interval.
    pub fn with_source(mut self, market: u32, symbol_id: u32, interval: Interval) -> Self {
        self.market = market;
        self.symbol_id = symbol_id;
        self.interval = interval;
        self
    }

    pub fn load_all(&self) -> Result<Vec<Candle>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut candles = Vec::new();
        for (line, result) in reader.deserialize().enumerate() {
            let record: CsvRecord =
                result.map_err(|e| DataError::ParseError(format!("row {}: {e}", line + 1)))?;
            let timestamp = parse_timestamp(&record.date)?;
            candles.push(
                Candle::new(
                    timestamp,
                    record.open,
                    record.high,
                    record.low,
                    record.close,
                    record.volume,
                )
                .with_source(self.market, self.symbol_id, self.interval),
            );
        }

        if candles.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        // stable, so rows sharing a timestamp keep file order
        candles.sort_by_key(|c| c.timestamp);
        debug!(path = %self.path.display(), count = candles.len(), "loaded candles");
        Ok(candles)
    }
}

/// Parse a date, date-time or Unix timestamp into milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix time; more than 10 digits means milliseconds
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {date_str}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("quant-data-{}-{name}.csv", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1970-01-02").unwrap(), 86_400_000);
        assert_eq!(parse_timestamp("1970-01-01 00:01:00").unwrap(), 60_000);
        assert_eq!(parse_timestamp("01/02/1970").unwrap(), 86_400_000);
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000);
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_load_sorts_and_stamps() {
        let path = write_csv(
            "sorted",
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-16,2,3,1,2.5,10\n\
             2024-01-15,1,2,0.5,1.5,20\n",
        );
        let candles = CsvCandleSource::new(&path)
            .unwrap()
            .with_source(1, 7, Interval::Day1)
            .load_all()
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(candles.len(), 2);
        assert!(candles[0].timestamp < candles[1].timestamp);
        assert_eq!(candles[0].close, 1.5);
        assert_eq!(candles[1].symbol_id, 7);
        assert_eq!(candles[1].interval, Interval::Day1);
    }

    #[test]
    fn test_volume_is_optional() {
        let path = write_csv("novolume", "timestamp,open,high,low,close\n60,1,2,0,1\n");
        let candles = CsvCandleSource::new(&path).unwrap().load_all().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(candles[0].timestamp, 60_000);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CsvCandleSource::new("/nonexistent/candles.csv"),
            Err(DataError::NoDataAvailable)
        ));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let path = write_csv("badrow", "date,open,high,low,close\n2024-01-15,x,2,0,1\n");
        let err = CsvCandleSource::new(&path).unwrap().load_all().unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("row 1"));
    }
}
