//! Trading signals emitted by strategies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional action requested by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    OpenLong,
    OpenShort,
    CloseLong,
    CloseShort,
}

impl SignalKind {
    /// True for kinds that reduce long exposure or add short exposure.
    pub fn is_bearish(&self) -> bool {
        matches!(self, SignalKind::OpenShort | SignalKind::CloseLong)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalKind::OpenLong => "openLong",
            SignalKind::OpenShort => "openShort",
            SignalKind::CloseLong => "closeLong",
            SignalKind::CloseShort => "closeShort",
        };
        f.write_str(s)
    }
}

/// A trading signal with a confidence in `[0, 1]`.
///
/// At most one signal is produced per candle; "no action" is `None`
/// at the call site, never a neutral kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub confidence: f64,
}

impl Signal {
    pub fn new(kind: SignalKind, confidence: f64) -> Self {
        Self { kind, confidence }
    }

    pub fn open_long() -> Self {
        Self::new(SignalKind::OpenLong, 1.0)
    }

    pub fn open_short() -> Self {
        Self::new(SignalKind::OpenShort, 1.0)
    }

    pub fn close_long() -> Self {
        Self::new(SignalKind::CloseLong, 1.0)
    }

    pub fn close_short() -> Self {
        Self::new(SignalKind::CloseShort, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_use_full_confidence() {
        assert_eq!(Signal::open_long(), Signal::new(SignalKind::OpenLong, 1.0));
        assert_eq!(Signal::close_short().confidence, 1.0);
    }

    #[test]
    fn test_bearish_kinds() {
        assert!(SignalKind::OpenShort.is_bearish());
        assert!(SignalKind::CloseLong.is_bearish());
        assert!(!SignalKind::OpenLong.is_bearish());
        assert!(!SignalKind::CloseShort.is_bearish());
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&Signal::close_long()).unwrap();
        assert_eq!(json, r#"{"kind":"closeLong","confidence":1.0}"#);
        assert_eq!(SignalKind::OpenShort.to_string(), "openShort");
    }
}
