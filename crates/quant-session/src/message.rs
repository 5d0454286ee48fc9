//! Wire messages for both session protocols.
//!
//! Enums are externally tagged with camelCase tags, e.g.
//! `{"update":{"candles":[...]}}` or `{"state":{"state":"..."}}`.

use quant_core::checkpoint::lossless;
use quant_core::types::{Candle, Signal, SignalKind};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, SessionError};

/// First message of every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Registered strategy name
    pub name: String,
    /// JSON configuration; blank selects the defaults
    #[serde(default)]
    pub config: String,
    /// Checkpoint to resume from; absent or blank starts fresh
    #[serde(default)]
    pub state: Option<String>,
    /// Collect debug series during updates
    #[serde(default)]
    pub debug: bool,
}

impl CreateRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: String::new(),
            state: None,
            debug: false,
        }
    }

    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = config.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The checkpoint to restore, if one was supplied.
    pub fn resume_state(&self) -> Option<&str> {
        self.state.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Inbound message of the batched protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchInput {
    Create(CreateRequest),
    Preload { candles: Vec<Candle> },
    Update { candles: Vec<Candle> },
}

/// A signal together with the candle that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub candle: Candle,
    pub kind: SignalKind,
    pub confidence: f64,
}

impl SignalRecord {
    pub fn new(candle: Candle, signal: Signal) -> Self {
        Self {
            candle,
            kind: signal.kind,
            confidence: signal.confidence,
        }
    }
}

/// One sample of a debug series, stamped with whole-second milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugPoint {
    pub ts: i64,
    #[serde(with = "lossless")]
    pub value: f64,
}

/// All samples of one named debug probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSeries {
    pub name: String,
    pub index: i32,
    pub values: Vec<DebugPoint>,
}

/// Outbound message of the batched protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchOutput {
    Signals(Vec<SignalRecord>),
    State { state: String },
    Debug(Vec<DebugSeries>),
}

/// Inbound message of the unbatched protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamInput {
    Create(CreateRequest),
    Preload { candle: Candle },
    Update { candle: Candle },
}

/// Outbound message of the unbatched protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamOutput {
    /// Reply to one update; `signal` is absent when there is no action
    Tick { signal: Option<Signal> },
    State { state: String },
}

/// Terminal status written to line-based transports when a session fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&SessionError> for SessionStatus {
    fn from(err: &SessionError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_accepts_minimal_json() {
        let message: BatchInput =
            serde_json::from_str(r#"{"create":{"name":"Turtle"}}"#).unwrap();
        assert_eq!(message, BatchInput::Create(CreateRequest::new("Turtle")));
    }

    #[test]
    fn test_blank_state_is_not_resumed() {
        assert_eq!(CreateRequest::new("Aldo").resume_state(), None);
        assert_eq!(CreateRequest::new("Aldo").with_state("").resume_state(), None);
        assert_eq!(
            CreateRequest::new("Aldo").with_state("{}").resume_state(),
            Some("{}")
        );
    }

    #[test]
    fn test_update_wire_shape() {
        let json = r#"{"update":{"candles":[{"timestamp":60000,"open":1.0,"high":2.0,"low":0.5,"close":1.5}]}}"#;
        let BatchInput::Update { candles } = serde_json::from_str(json).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].close, 1.5);
        assert_eq!(candles[0].volume, 0.0);
    }

    #[test]
    fn test_outbound_tags() {
        let state = serde_json::to_string(&BatchOutput::State { state: "x".into() }).unwrap();
        assert_eq!(state, r#"{"state":{"state":"x"}}"#);

        let tick = serde_json::to_string(&StreamOutput::Tick { signal: None }).unwrap();
        assert_eq!(tick, r#"{"tick":{"signal":null}}"#);

        let record = SignalRecord::new(Candle::from_close(1.0), Signal::close_long());
        let json = serde_json::to_string(&BatchOutput::Signals(vec![record])).unwrap();
        assert!(json.starts_with(r#"{"signals":[{"candle":"#));
        assert!(json.contains(r#""kind":"closeLong""#));
    }

    #[test]
    fn test_debug_points_keep_nan() {
        let point = DebugPoint {
            ts: 1000,
            value: f64::NAN,
        };
        let json = serde_json::to_string(&point).unwrap();
        let back: DebugPoint = serde_json::from_str(&json).unwrap();
        assert!(back.value.is_nan());
    }

    #[test]
    fn test_status_from_error() {
        let status = SessionStatus::from(&SessionError::Protocol("First message must be Create".into()));
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(
            json,
            r#"{"code":"invalidArgument","message":"First message must be Create"}"#
        );
    }
}
