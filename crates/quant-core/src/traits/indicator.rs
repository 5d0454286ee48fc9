//! Indicator trait definitions.

use crate::checkpoint::Checkpoint;
use crate::types::Candle;

/// Streaming indicator that maintains internal state.
///
/// Indicators consume one candle at a time and keep O(1) rolling state.
/// They are pure functions of their update history and can be checkpointed
/// and restored at any point.
pub trait Indicator: Checkpoint + Send + Sync {
    /// Update the indicator with a new candle.
    fn update(&mut self, candle: &Candle);

    /// Whether enough history has been seen for `value` to be meaningful.
    ///
    /// Once true, stays true.
    fn is_ready(&self) -> bool;

    /// Current indicator value.
    fn value(&self) -> f64;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}
