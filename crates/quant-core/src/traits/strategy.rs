//! Strategy trait definitions.

use crate::checkpoint::Checkpoint;
use crate::error::StrategyError;
use crate::types::{Candle, DebugProbe, Signal};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// Core strategy trait.
///
/// A strategy owns its indicators exclusively and advances them on every
/// candle, whether the candle arrives as history (`preload`) or live
/// (`update`). Its whole state, configuration included, round-trips through
/// [`Checkpoint`].
pub trait Strategy: Checkpoint + Send {
    /// Get the registered name of this strategy.
    fn name(&self) -> &str;

    /// Advance state with a historical candle. Never produces a signal.
    fn preload(&mut self, candle: &Candle);

    /// Advance state with a live candle and optionally emit a signal.
    fn update(&mut self, candle: &Candle) -> Option<Signal>;

    /// Diagnostic probes for the most recent candle.
    ///
    /// Available regardless of readiness.
    fn debug(&self, _candle: &Candle) -> Vec<DebugProbe> {
        Vec::new()
    }

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }
}
