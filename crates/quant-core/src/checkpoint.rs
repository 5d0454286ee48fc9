//! Checkpoint encoding shared by indicators and strategies.
//!
//! A checkpoint is an opaque JSON string holding exactly the mutable state of
//! a component. Nested components embed their own checkpoint as a string
//! field, so every layer restores itself independently.

use crate::error::CheckpointError;
use serde::de::{self, DeserializeOwned, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Round-trippable state of a streaming component.
pub trait Checkpoint {
    /// Serialize the current state into an opaque string.
    fn checkpoint(&self) -> Result<String, CheckpointError>;

    /// Replace the current state with one produced by [`Checkpoint::checkpoint`].
    fn restore(&mut self, data: &str) -> Result<(), CheckpointError>;
}

/// Encode a checkpoint record as JSON.
pub fn encode<T: Serialize>(kind: &'static str, record: &T) -> Result<String, CheckpointError> {
    serde_json::to_string(record).map_err(|source| CheckpointError::Encode { kind, source })
}

/// Decode a checkpoint record from JSON.
pub fn decode<T: DeserializeOwned>(kind: &'static str, data: &str) -> Result<T, CheckpointError> {
    serde_json::from_str(data).map_err(|source| CheckpointError::Malformed { kind, source })
}

/// An `f64` that survives a JSON round trip even when it is not finite.
///
/// Finite values are written as plain numbers. NaN and the infinities are
/// written as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lossless(pub f64);

impl Serialize for Lossless {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        if value.is_finite() {
            serializer.serialize_f64(value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value > 0.0 {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }
}

struct LosslessVisitor;

impl<'de> Visitor<'de> for LosslessVisitor {
    type Value = Lossless;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number or one of \"NaN\", \"Infinity\", \"-Infinity\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Lossless, E> {
        Ok(Lossless(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Lossless, E> {
        Ok(Lossless(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Lossless, E> {
        Ok(Lossless(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Lossless, E> {
        match v {
            "NaN" => Ok(Lossless(f64::NAN)),
            "Infinity" => Ok(Lossless(f64::INFINITY)),
            "-Infinity" => Ok(Lossless(f64::NEG_INFINITY)),
            other => Err(E::invalid_value(Unexpected::Str(other), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Lossless {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LosslessVisitor)
    }
}

/// `#[serde(with = "...")]` adapter for a single lossless `f64` field.
pub mod lossless {
    use super::Lossless;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        Lossless(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Lossless::deserialize(deserializer).map(|v| v.0)
    }
}

/// `#[serde(with = "...")]` adapter for a sequence of lossless `f64` values.
pub mod lossless_seq {
    use super::Lossless;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| Lossless(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Lossless>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "lossless")]
        value: f64,
        #[serde(with = "lossless_seq")]
        values: Vec<f64>,
    }

    #[test]
    fn test_non_finite_values_round_trip() {
        let sample = Sample {
            value: f64::NAN,
            values: vec![1.5, f64::INFINITY, f64::NEG_INFINITY],
        };
        let json = encode("sample", &sample).unwrap();
        assert!(json.contains("\"NaN\""));

        let back: Sample = decode("sample", &json).unwrap();
        assert!(back.value.is_nan());
        assert_eq!(back.values[0], 1.5);
        assert_eq!(back.values[1], f64::INFINITY);
        assert_eq!(back.values[2], f64::NEG_INFINITY);
    }

    #[test]
    fn test_finite_values_are_exact() {
        let sample = Sample {
            value: 0.1 + 0.2,
            values: vec![1.0 / 3.0, 1e-300],
        };
        let back: Sample = decode("sample", &encode("sample", &sample).unwrap()).unwrap();
        assert_eq!(back.value.to_bits(), (0.1f64 + 0.2).to_bits());
        assert_eq!(back.values[0].to_bits(), (1.0f64 / 3.0).to_bits());
    }

    #[test]
    fn test_rejects_unknown_symbol() {
        let result: Result<Sample, _> = decode("sample", r#"{"value":"oops","values":[]}"#);
        assert!(matches!(result, Err(CheckpointError::Malformed { .. })));
    }
}
