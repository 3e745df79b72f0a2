//! Opaque query cursors
//!
//! A cursor marks a position in a query result stream. The bytes are
//! meaningful only to the query service; this crate compares them byte for
//! byte and hands them back unchanged as a query start cursor.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{CursorError, DatastoreError};

/// Opaque, immutable position token in a query result stream
///
/// The text form (`Display` / `FromStr` / serde) is standard base64, the
/// same encoding other Datastore clients use when cursors are passed around
/// as strings. An empty cursor means the service had no position to report.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cursor(Vec<u8>);

impl Cursor {
    /// Create a cursor from the raw bytes returned by the service
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a cursor from its base64 text form
    ///
    /// # Arguments
    /// * `encoded` - Base64 string, as produced by `Display`
    ///
    /// # Returns
    /// * `Result<Cursor, CursorError>` - Decoded cursor or encoding error
    pub fn from_base64(encoded: &str) -> Result<Self, CursorError> {
        STANDARD
            .decode(encoded.trim())
            .map(Self)
            .map_err(|e| CursorError::InvalidEncoding(e.to_string()))
    }

    /// Encode the cursor to base64
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Raw cursor bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the cursor, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// True if the service reported no position
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({})", hex::encode(&self.0))
    }
}

impl FromStr for Cursor {
    type Err = DatastoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_base64(s)?)
    }
}

impl From<Vec<u8>> for Cursor {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Cursor {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Cursor {
    /// Raw bytes of the string, not a base64 decode
    fn from(bytes: &str) -> Self {
        Self(bytes.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Cursor {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}
