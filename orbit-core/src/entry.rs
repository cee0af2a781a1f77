//! Entry identifiers returned by the service after a write.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identifier (hash) of an entry written to a remote database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryHash(String);

impl EntryHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an entry identifier from a write response.
    ///
    /// Strings are taken as-is and other scalars by their JSON text. Objects,
    /// arrays and null are not identifiers and yield `None`.
    pub fn from_response(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            Value::Bool(b) => Some(Self(b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl std::fmt::Display for EntryHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntryHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

impl From<&str> for EntryHash {
    fn from(hash: &str) -> Self {
        Self(hash.to_string())
    }
}
