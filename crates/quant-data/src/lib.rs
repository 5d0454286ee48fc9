//! Candle sources for offline replay.

mod csv_source;

pub use csv_source::CsvCandleSource;

use quant_core::error::DataError;
use quant_core::types::{Candle, Interval};
use std::path::Path;

/// Load candles from a CSV file without blocking the runtime.
pub async fn load_csv(
    path: &Path,
    market: u32,
    symbol_id: u32,
    interval: Interval,
) -> Result<Vec<Candle>, DataError> {
    let source = CsvCandleSource::new(path)?.with_source(market, symbol_id, interval);
    tokio::task::spawn_blocking(move || source.load_all())
        .await
        .map_err(|e| DataError::Io(std::io::Error::other(e)))?
}
