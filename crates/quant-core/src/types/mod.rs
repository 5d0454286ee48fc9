//! Core data types for the strategy engine.

mod candle;
mod debug;
mod interval;
mod signal;

pub use candle::Candle;
pub use debug::DebugProbe;
pub use interval::Interval;
pub use signal::{Signal, SignalKind};
