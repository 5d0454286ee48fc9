//! Diagnostic values exposed by strategies.

use serde::{Deserialize, Serialize};

/// A named scalar sampled from a strategy for charting.
///
/// `index` groups probes that belong on the same chart pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugProbe {
    pub name: String,
    pub index: i32,
    pub value: f64,
}

impl DebugProbe {
    pub fn new(name: impl Into<String>, index: i32, value: f64) -> Self {
        Self {
            name: name.into(),
            index,
            value,
        }
    }

    /// Probe for a boolean flag, charted as 0 or 1.
    pub fn flag(name: impl Into<String>, index: i32, value: bool) -> Self {
        Self::new(name, index, if value { 1.0 } else { 0.0 })
    }
}
