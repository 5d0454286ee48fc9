//! Per-session context, limits and bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info_span, Span};
use uuid::Uuid;

use crate::cancel::CancelToken;

/// Outbound batching limits for the batched protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Signals per outbound signal message
    pub signal_chunk_size: usize,
    /// Debug series per outbound debug message
    pub debug_chunk_size: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            signal_chunk_size: 200,
            debug_chunk_size: 2,
        }
    }
}

impl SessionLimits {
    pub fn validate(&self) -> Result<(), String> {
        if self.signal_chunk_size == 0 || self.debug_chunk_size == 0 {
            return Err("Session chunk sizes must be at least 1".into());
        }
        Ok(())
    }
}

/// Identity, tracing span and cancellation token of one session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub span: Span,
    pub cancel: CancelToken,
}

impl SessionContext {
    pub fn new(cancel: CancelToken) -> Self {
        let id = Uuid::new_v4();
        let span = info_span!("session", session_id = %id);
        Self { id, span, cancel }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingCreate,
    Processing,
    Finalizing,
    Closed,
}

impl Phase {
    /// Whether `next` directly follows this phase. Any phase may close.
    pub fn can_advance_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::AwaitingCreate, Phase::Processing)
                | (Phase::Processing, Phase::Finalizing)
                | (_, Phase::Closed)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::AwaitingCreate => "awaiting_create",
            Phase::Processing => "processing",
            Phase::Finalizing => "finalizing",
            Phase::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// Counters reported when a session finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub strategy: String,
    pub preloaded: usize,
    pub updated: usize,
    pub signals: usize,
    pub debug_series: usize,
    pub cancelled: bool,
}

impl SessionSummary {
    pub fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = SessionLimits::default();
        assert_eq!(limits.signal_chunk_size, 200);
        assert_eq!(limits.debug_chunk_size, 2);
        assert!(limits.validate().is_ok());
        assert!(SessionLimits {
            debug_chunk_size: 0,
            ..limits
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_phase_order() {
        assert!(Phase::AwaitingCreate.can_advance_to(Phase::Processing));
        assert!(Phase::Processing.can_advance_to(Phase::Finalizing));
        assert!(Phase::AwaitingCreate.can_advance_to(Phase::Closed));
        assert!(!Phase::AwaitingCreate.can_advance_to(Phase::Finalizing));
        assert!(!Phase::Finalizing.can_advance_to(Phase::Processing));
    }

    #[test]
    fn test_contexts_get_distinct_ids() {
        let a = SessionContext::new(CancelToken::new());
        let b = SessionContext::new(CancelToken::new());
        assert_ne!(a.id, b.id);
    }
}
