//! Database parameters and capability sets.
//!
//! A [`DbParams`] is the immutable configuration snapshot a handle is built
//! from. The service describes databases with loosely-typed JSON, so
//! [`DbParams::from_value`] does the field-by-field checking and reports the
//! first missing or malformed field.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Capability name that marks a database as queryable.
pub const CAPABILITY_QUERY: &str = "query";
/// Capability name that marks a database as accepting `put`.
pub const CAPABILITY_PUT: &str = "put";

/// Set of capability names a remote database supports.
///
/// Accepts either a JSON array of names or a JSON object whose keys are the
/// names. Always serializes as a sorted array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeSet<String>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a capability set from a JSON array of names or a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(name),
                    other => Err(ConfigError::InvalidValue {
                        field: "capabilities".to_string(),
                        reason: format!("capability names must be strings, got {}", other),
                    }),
                })
                .collect::<Result<BTreeSet<_>, _>>()
                .map(Self),
            Value::Object(map) => Ok(Self(map.into_iter().map(|(name, _)| name).collect())),
            other => Err(ConfigError::InvalidValue {
                field: "capabilities".to_string(),
                reason: format!("expected an array or object, got {}", other),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Capabilities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Configuration snapshot for one remote database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbParams {
    pub dbname: String,
    pub id: String,
    #[serde(rename = "type")]
    pub db_type: String,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(rename = "indexBy", default, skip_serializing_if = "Option::is_none")]
    pub index_by: Option<String>,
    /// Any other fields the service reported, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DbParams {
    pub fn new(dbname: impl Into<String>, id: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            dbname: dbname.into(),
            id: id.into(),
            db_type: db_type.into(),
            capabilities: Capabilities::default(),
            index_by: None,
            extra: Map::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn with_index_by(mut self, field: impl Into<String>) -> Self {
        self.index_by = Some(field.into());
        self
    }

    /// Parse and validate parameters from a loosely-typed JSON object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Value::Object(mut map) = value else {
            return Err(ConfigError::InvalidValue {
                field: "params".to_string(),
                reason: "expected a JSON object".to_string(),
            });
        };

        let dbname = take_required_string(&mut map, "dbname")?;
        let id = take_required_string(&mut map, "id")?;
        let db_type = take_required_string(&mut map, "type")?;

        let capabilities = match map.remove("capabilities") {
            None | Some(Value::Null) => Capabilities::default(),
            Some(value) => Capabilities::from_value(value)?,
        };

        let index_by = match map.remove("indexBy") {
            None | Some(Value::Null) => None,
            Some(Value::String(field)) => Some(field),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "indexBy".to_string(),
                    reason: format!("expected a string, got {}", other),
                })
            }
        };

        let params = Self {
            dbname,
            id,
            db_type,
            capabilities,
            index_by,
            extra: map,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("dbname", &self.dbname), ("id", &self.id), ("type", &self.db_type)] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if let Some(field) = &self.index_by {
            if field.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "indexBy".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains(name)
    }
}

fn take_required_string(map: &mut Map<String, Value>, field: &str) -> Result<String, ConfigError> {
    match map.remove(field) {
        None | Some(Value::Null) => Err(ConfigError::MissingRequired {
            field: field.to_string(),
        }),
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}
