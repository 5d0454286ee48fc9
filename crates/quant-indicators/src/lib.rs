//! Streaming technical indicators.
//!
//! Every indicator consumes one candle at a time, keeps fixed-size rolling
//! state and checkpoints itself losslessly:
//! - Moving averages (SMA, EMA, SMMA)
//! - Momentum indicators (RSI, CCI, MACD)
//! - Volatility indicators (ATR)

pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use momentum::{Cci, Macd, Rsi};
pub use moving_average::{Ema, Sma, Smma};
pub use volatility::Atr;
