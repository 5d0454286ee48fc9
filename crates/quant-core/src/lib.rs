//! Core types and traits for the strategy engine.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Candle, Interval)
//! - Trading signals and debug probes
//! - Fixed-capacity rolling windows
//! - Checkpoint encoding shared by every stateful component
//! - Core traits for indicators, strategies and strategy providers

pub mod checkpoint;
pub mod error;
pub mod traits;
pub mod types;
pub mod window;

pub use checkpoint::Checkpoint;
pub use error::{CheckpointError, DataError, StrategyError};
pub use traits::*;
pub use types::*;
pub use window::RingWindow;
