//! Index field lookup for items written with `put`.
//!
//! An item exposes its index value either as a structured field (typed
//! records) or as a keyed entry (maps and JSON objects). Lookup tries the
//! structured field first and falls back to the keyed entry.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::error::FieldAccessError;

/// Field lookup used to compute an item's index value.
///
/// # Example
/// ```ignore
/// struct Post { title: String, body: String }
///
/// impl FieldAccess for Post {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "title" => Some(Value::String(self.title.clone())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait FieldAccess {
    /// Structured field lookup.
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Key-based lookup.
    fn entry(&self, _key: &str) -> Option<Value> {
        None
    }
}

/// Resolve `name` on `item`: structured field, then keyed entry.
pub fn index_value<T: FieldAccess + ?Sized>(item: &T, name: &str) -> Result<Value, FieldAccessError> {
    item.field(name)
        .or_else(|| item.entry(name))
        .ok_or_else(|| FieldAccessError::Missing {
            field: name.to_string(),
        })
}

impl FieldAccess for Value {
    fn entry(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|map| map.get(key)).cloned()
    }
}

impl<V: Serialize> FieldAccess for HashMap<String, V> {
    fn entry(&self, key: &str) -> Option<Value> {
        self.get(key).and_then(|v| serde_json::to_value(v).ok())
    }
}

impl<V: Serialize> FieldAccess for BTreeMap<String, V> {
    fn entry(&self, key: &str) -> Option<Value> {
        self.get(key).and_then(|v| serde_json::to_value(v).ok())
    }
}

impl<T: FieldAccess + ?Sized> FieldAccess for &T {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }

    fn entry(&self, key: &str) -> Option<Value> {
        (**self).entry(key)
    }
}
