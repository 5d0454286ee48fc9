//! Streaming strategy sessions.
//!
//! A session creates one strategy from the first inbound message, feeds it
//! candles in arrival order, and finishes with the queued signals, exactly
//! one state checkpoint and optional debug series. Two protocol variants are
//! provided: batched (`run_batched`) and one candle per message
//! (`run_streaming`).

pub mod cancel;
pub mod context;
pub mod controller;
pub mod debug;
pub mod error;
pub mod message;
pub mod transport;

pub use cancel::CancelToken;
pub use context::{Phase, SessionContext, SessionLimits, SessionSummary};
pub use controller::SessionController;
pub use debug::DebugCollector;
pub use error::{ErrorCode, SessionError, TransportError};
pub use message::{
    BatchInput, BatchOutput, CreateRequest, DebugPoint, DebugSeries, SessionStatus, SignalRecord,
    StreamInput, StreamOutput,
};
pub use transport::{json_lines, JsonLinesSink, MessageSink};
