//! Opaque 12-byte identifiers for tracked entities and their derived records.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::CoreError;

/// Per-process random discriminator, drawn once.
static PROCESS_NONCE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A 12-byte unique key: 4-byte big-endian unix seconds, 5 random
/// process bytes, 3-byte wrapping counter.
///
/// Rendered as 24 lowercase hex characters in documents and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId([u8; 12]);

impl EntityId {
    /// Generate a fresh id stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Generate a fresh id stamped with `at` (seconds precision).
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        let nonce = PROCESS_NONCE.get_or_init(rand::random::<[u8; 5]>);
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        let secs = u32::try_from(at.timestamp().max(0)).unwrap_or(u32::MAX);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(nonce);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// The creation second encoded in the id.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        DateTime::from_timestamp(i64::from(secs), 0)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for EntityId {
    type Err = CoreError;

    /// Accepts exactly 24 hex digits, in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| CoreError::InvalidEntityId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_through_parse() {
        let id = EntityId::new();
        let parsed: EntityId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(id.to_string().len(), 24);
    }

    #[test]
    fn consecutive_ids_are_distinct() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn timestamp_is_encoded_in_leading_bytes() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let id = EntityId::at(at);
        assert_eq!(id.timestamp(), Some(at));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            "abc".parse::<EntityId>(),
            Err(CoreError::InvalidEntityId(_))
        ));
    }

    #[test]
    fn rejects_non_hex() {
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<EntityId>().is_err());
    }

    #[test]
    fn rejects_signed_pairs() {
        assert!(matches!(
            "+a+a+a+a+a+a+a+a+a+a+a+a".parse::<EntityId>(),
            Err(CoreError::InvalidEntityId(_))
        ));
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        let id = EntityId::new();
        assert!(format!(" {id}").parse::<EntityId>().is_err());
        assert!(format!("{id}\n").parse::<EntityId>().is_err());
    }

    #[test]
    fn uppercase_input_parses_to_lowercase_text() {
        let parsed: EntityId = "66D1F0C2A1B2C3D4E5F60718".parse().unwrap();
        assert_eq!(parsed.to_string(), "66d1f0c2a1b2c3d4e5f60718");
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = EntityId::from_bytes([0xab; 12]);
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::json!("abababababababababababab"));
        let back: EntityId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
