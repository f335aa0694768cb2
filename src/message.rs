//! The external ACARS message type consumed by every decoder.
//!
//! Messages are produced by a transport layer outside this crate (SDR
//! ingest, NATS feeds, JSON files). Some feeds send the numeric `id` as a
//! string, so deserialization accepts either; unparseable ids collapse to 0
//! rather than rejecting the whole message.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::types::Direction;

/// A raw ACARS message. Read-only input to all decoders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "flexible_i64")]
    pub id: i64,
    /// ACARS label, e.g. "B6", "5Z", "H1".
    #[serde(default)]
    pub label: String,
    /// Message body. May be text or hex-encoded binary depending on label.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
    /// Aircraft registration/tail if the transport layer knows it.
    #[serde(default)]
    pub tail: String,
    /// Link direction if the transport layer knows it.
    #[serde(default)]
    pub direction: Option<Direction>,
}

/// Accepts an i64 as a JSON number or a string. Floats truncate toward
/// zero; empty or unparseable strings deserialize to 0.
fn flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlexVisitor;

    impl Visitor<'_> for FlexVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            Ok(v.trim().parse().unwrap_or(0))
        }
    }

    deserializer.deserialize_any(FlexVisitor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_numeric_id() {
        let msg: Message =
            serde_json::from_str(r#"{"id": 123, "label": "B6", "text": "X"}"#).unwrap();
        assert_eq!(msg.id, 123);
        assert_eq!(msg.label, "B6");
        assert_eq!(msg.text, "X");
    }

    #[test]
    fn test_deserialize_string_id() {
        let msg: Message = serde_json::from_str(r#"{"id": "456", "label": "5Z"}"#).unwrap();
        assert_eq!(msg.id, 456);
    }

    #[test]
    fn test_deserialize_float_id_truncates() {
        let msg: Message = serde_json::from_str(r#"{"id": 123.5, "label": "B6"}"#).unwrap();
        assert_eq!(msg.id, 123);
        assert_eq!(msg.label, "B6");

        let msg: Message = serde_json::from_str(r#"{"id": -7.9}"#).unwrap();
        assert_eq!(msg.id, -7);
    }

    #[test]
    fn test_deserialize_garbage_id_defaults_to_zero() {
        let msg: Message = serde_json::from_str(r#"{"id": "not-a-number"}"#).unwrap();
        assert_eq!(msg.id, 0);

        let msg: Message = serde_json::from_str(r#"{"id": ""}"#).unwrap();
        assert_eq!(msg.id, 0);
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let msg: Message = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(msg.id, 0);
        assert!(msg.label.is_empty());
        assert!(msg.direction.is_none());
    }

    #[test]
    fn test_deserialize_direction() {
        let msg: Message =
            serde_json::from_str(r#"{"id": 1, "direction": "downlink"}"#).unwrap();
        assert_eq!(msg.direction, Some(Direction::Downlink));
    }
}
