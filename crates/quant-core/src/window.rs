//! Fixed-capacity rolling window addressed by a monotonically growing age.

use crate::checkpoint::lossless_seq;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Circular buffer of `f64` observations.
///
/// Storage is allocated once. Logical ages map to physical slots with
/// `((age % N) + N) % N`, so negative offsets resolve to earlier slots.
#[derive(Debug, Clone, PartialEq)]
pub struct RingWindow {
    slots: Vec<f64>,
}

impl RingWindow {
    /// Create a zero-filled window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            slots: vec![0.0; capacity],
        }
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn slot(&self, age: i64) -> usize {
        age.rem_euclid(self.slots.len() as i64) as usize
    }

    /// Value stored for the given age.
    #[inline]
    pub fn get(&self, age: i64) -> f64 {
        self.slots[self.slot(age)]
    }

    /// Store a value for the given age.
    #[inline]
    pub fn set(&mut self, age: i64, value: f64) {
        let slot = self.slot(age);
        self.slots[slot] = value;
    }

    /// Store a value for the given age and return the one it evicted.
    #[inline]
    pub fn replace(&mut self, age: i64, value: f64) -> f64 {
        let slot = self.slot(age);
        std::mem::replace(&mut self.slots[slot], value)
    }

    /// Slots in physical order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.slots.iter().copied()
    }

    pub fn sum(&self) -> f64 {
        self.slots.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.slots.len() as f64
    }

    pub fn max(&self) -> f64 {
        self.slots.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.slots.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

impl Serialize for RingWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        lossless_seq::serialize(&self.slots, serializer)
    }
}

impl<'de> Deserialize<'de> for RingWindow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = lossless_seq::deserialize(deserializer)?;
        if slots.is_empty() {
            return Err(D::Error::custom("ring window must have at least one slot"));
        }
        Ok(Self { slots })
    }
}
