//! Accumulation of debug probes into named series.

use quant_core::types::{Candle, DebugProbe};
use std::collections::HashMap;

use crate::message::{DebugPoint, DebugSeries};

/// Groups probe samples by name, keeping first-seen order.
#[derive(Debug, Default)]
pub struct DebugCollector {
    series: Vec<DebugSeries>,
    by_name: HashMap<String, usize>,
}

impl DebugCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the probes sampled for `candle`.
    ///
    /// Points are stamped with the candle timestamp truncated to whole seconds.
    pub fn record(&mut self, candle: &Candle, probes: Vec<DebugProbe>) {
        let ts = candle.timestamp_secs_ms();
        for probe in probes {
            let index = probe.index;
            let series = &mut self.series;
            let slot = *self.by_name.entry(probe.name).or_insert_with_key(|name| {
                series.push(DebugSeries {
                    name: name.clone(),
                    index,
                    values: Vec::new(),
                });
                series.len() - 1
            });
            self.series[slot].values.push(DebugPoint {
                ts,
                value: probe.value,
            });
        }
    }

    /// Number of distinct series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_series(self) -> Vec<DebugSeries> {
        self.series
    }
}
