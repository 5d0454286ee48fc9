//! Core traits for the strategy engine.

mod indicator;
mod provider;
mod strategy;

pub use indicator::Indicator;
pub use provider::{StrategyEntry, StrategyProvider};
pub use strategy::{Strategy, StrategyConfig};
