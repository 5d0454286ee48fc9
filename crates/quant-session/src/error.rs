//! Session and transport errors.

use quant_core::error::{CheckpointError, StrategyError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure moving messages in or out of a session.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Outbound channel closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid message: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Status class reported to the client when a session fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    InvalidArgument,
    Cancelled,
    Unavailable,
    Internal,
}

/// Session-fatal errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Protocol(String),

    #[error("Strategy {0} not found")]
    UnknownStrategy(String),

    #[error("Invalid strategy configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to restore strategy state: {0}")]
    Restore(#[source] CheckpointError),

    #[error("Failed to checkpoint strategy state: {0}")]
    Checkpoint(#[source] CheckpointError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Session cancelled before Create")]
    Cancelled,
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::Protocol(_)
            | SessionError::UnknownStrategy(_)
            | SessionError::InvalidConfig(_)
            | SessionError::Restore(_) => ErrorCode::InvalidArgument,
            SessionError::Cancelled => ErrorCode::Cancelled,
            SessionError::Transport(_) => ErrorCode::Unavailable,
            SessionError::Checkpoint(_) => ErrorCode::Internal,
        }
    }
}

impl From<StrategyError> for SessionError {
    fn from(err: StrategyError) -> Self {
        match err {
            StrategyError::NotFound(name) => SessionError::UnknownStrategy(name),
            StrategyError::InvalidConfig(reason) => SessionError::InvalidConfig(reason),
            StrategyError::Checkpoint(source) => SessionError::Restore(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_errors_are_invalid_arguments() {
        let err = SessionError::from(StrategyError::NotFound("Foo".into()));
        assert_eq!(err.to_string(), "Strategy Foo not found");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = SessionError::from(StrategyError::InvalidConfig("bad".into()));
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_transport_errors_are_unavailable() {
        let err = SessionError::from(TransportError::Closed);
        assert_eq!(err.code(), ErrorCode::Unavailable);
        assert_eq!(SessionError::Cancelled.code(), ErrorCode::Cancelled);
    }
}
