//! Trading strategy implementations.
//!
//! This crate provides the built-in strategies and the registry sessions use
//! to create them by name:
//! - SuperTrend (ATR bands with a trailing stop)
//! - Turtle (Donchian breakouts with a bull-market filter)
//! - Aldo (price/oscillator divergence)
//! - SuperTrendTurtle (agreement of SuperTrend and Turtle)

mod aldo;
mod registry;
mod stop_loss;
mod supertrend;
mod supertrend_turtle;
mod turtle;

pub use aldo::{AldoConfig, AldoStrategy, OscillatorKind};
pub use registry::StrategyRegistry;
pub use stop_loss::TrailingStopLoss;
pub use supertrend::{SuperTrendConfig, SuperTrendStrategy};
pub use supertrend_turtle::{SuperTrendTurtleConfig, SuperTrendTurtleStrategy};
pub use turtle::{TurtleConfig, TurtleStrategy};
