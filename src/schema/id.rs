//! Document identifiers.
//!
//! Ids are 12 raw bytes, rendered as 24 lowercase hex characters in stored
//! documents and projections. The accepted forms are load-bearing for data
//! that is already persisted: a 12-byte raw value or a 24-character hex
//! string, nothing else.

use crate::error::{SchemaError, SchemaResult};
use bson::oid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Length of a raw id in bytes.
pub const ID_BYTES: usize = 12;

/// Length of an id rendered as hex.
pub const ID_HEX_LEN: usize = 24;

/// A 12-byte document identifier.
///
/// Wraps the BSON object id so fresh ids follow the document-store layout,
/// while serialization stays a plain hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(oid::ObjectId);

impl ObjectId {
    /// Generates a fresh id: 4 bytes of seconds since the epoch, 5 bytes
    /// unique to this process, 3 bytes of an incrementing counter.
    pub fn new() -> Self {
        Self(oid::ObjectId::new())
    }

    pub const fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(oid::ObjectId::from_bytes(bytes))
    }

    /// Builds an id from a raw byte slice, which must be exactly 12 bytes long.
    pub fn from_slice(bytes: &[u8]) -> SchemaResult<Self> {
        let raw: [u8; ID_BYTES] = bytes.try_into().map_err(|_| {
            SchemaError::InvalidData(format!(
                "Raw id must be {} bytes, got {}",
                ID_BYTES,
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(raw))
    }

    /// Parses a 24-character hex string.
    pub fn parse_str(s: &str) -> SchemaResult<Self> {
        if !is_valid_id(s) {
            return Err(SchemaError::InvalidData(format!("'{}' is not a valid id", s)));
        }
        oid::ObjectId::parse_str(s)
            .map(Self)
            .map_err(|e| SchemaError::InvalidData(format!("'{}' is not a valid id: {}", s, e)))
    }

    pub const fn bytes(&self) -> [u8; ID_BYTES] {
        self.0.bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Seconds since the epoch encoded in the first four bytes.
    pub fn timestamp(&self) -> u32 {
        let bytes = self.bytes();
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl From<oid::ObjectId> for ObjectId {
    fn from(id: oid::ObjectId) -> Self {
        Self(id)
    }
}

impl From<ObjectId> for oid::ObjectId {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::String(id.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns true when `s` is a 24-character hex string.
pub fn is_valid_id(s: &str) -> bool {
    s.len() == ID_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns true when `bytes` is a 12-byte raw identifier.
pub fn is_valid_id_bytes(bytes: &[u8]) -> bool {
    bytes.len() == ID_BYTES
}

/// Normalises the JSON forms a caller may hand a relationship field into an id.
///
/// Accepts a hex string, a raw 12-element byte array, a `{ "$oid": .. }`
/// wrapper or an embedded document carrying `_id`. Null and blank strings
/// normalise to `None`.
pub fn id_from_value(name: &str, value: &Value) -> SchemaResult<Option<ObjectId>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else if is_valid_id(trimmed) {
                ObjectId::parse_str(&trimmed.to_ascii_lowercase()).map(Some)
            } else {
                Err(invalid_id(name))
            }
        }
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            match bytes {
                Some(bytes) if is_valid_id_bytes(&bytes) => ObjectId::from_slice(&bytes).map(Some),
                _ => Err(invalid_id(name)),
            }
        }
        Value::Object(map) => match map.get("$oid").or_else(|| map.get("_id")) {
            Some(inner @ (Value::String(_) | Value::Array(_))) => id_from_value(name, inner),
            _ => Err(invalid_id(name)),
        },
        _ => Err(invalid_id(name)),
    }
}

fn invalid_id(name: &str) -> SchemaError {
    SchemaError::Validation(format!("Please use a valid ID for '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_ids_validate() {
        assert!(is_valid_id("507f191e810c19729de860ea"));
        assert!(!is_valid_id("abc"));
        assert!(!is_valid_id("zzzzzzzzzzzz"));
        assert!(!is_valid_id("507f191e810c19729de860eg"));
    }

    #[test]
    fn raw_ids_validate() {
        assert!(is_valid_id_bytes(&[0u8; 12]));
        assert!(!is_valid_id_bytes(&[0u8; 11]));
    }

    #[test]
    fn generated_ids_are_distinct_and_round_trip() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_hex().len(), ID_HEX_LEN);
        assert_eq!(ObjectId::parse_str(&a.to_hex()).unwrap(), a);
        assert_eq!(ObjectId::parse_str("507F191E810C19729DE860EA").unwrap().to_hex(), "507f191e810c19729de860ea");
    }

    #[test]
    fn timestamp_reads_the_leading_bytes() {
        let before = chrono::Utc::now().timestamp() as u32;
        let id = ObjectId::new();
        assert!(id.timestamp() >= before);
        assert_eq!(ObjectId::from_bytes([0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0]).timestamp(), 256);
    }

    #[test]
    fn twelve_char_strings_are_not_ids() {
        let err = id_from_value("author", &json!("hello world!")).unwrap_err();
        assert!(matches!(err, SchemaError::Validation(_)));
    }

    #[test]
    fn accepted_json_forms() {
        let hex = "507f191e810c19729de860ea";
        let id = ObjectId::parse_str(hex).unwrap();

        assert_eq!(id_from_value("f", &json!(hex)).unwrap(), Some(id));
        assert_eq!(id_from_value("f", &json!({ "$oid": hex })).unwrap(), Some(id));
        assert_eq!(
            id_from_value("f", &json!({ "_id": hex, "title": "x" })).unwrap(),
            Some(id)
        );
        assert_eq!(id_from_value("f", &json!(id.bytes().to_vec())).unwrap(), Some(id));
        assert_eq!(id_from_value("f", &json!("   ")).unwrap(), None);
        assert_eq!(id_from_value("f", &Value::Null).unwrap(), None);
        assert!(id_from_value("f", &json!(42)).is_err());
    }
}
