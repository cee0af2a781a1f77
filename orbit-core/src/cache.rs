//! In-process read cache owned by a single database handle.
//!
//! Every value leaving the cache is an owned clone. Callers never get a
//! reference into the stored map, so mutating a returned value can never
//! change what the cache holds.

use std::collections::HashMap;

use serde_json::Value;

use crate::entry::EntryHash;

/// Derive the cache key for a JSON value.
///
/// JSON strings key by their raw text (`"H123"` keys as `H123`); any other
/// value keys by its JSON text.
pub fn cache_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Anything usable as a logical cache key.
///
/// Every key type maps to the same string form: text keys by their raw
/// text, JSON values through [`cache_key`], numbers by their decimal text.
/// A JSON string `"x"` and the text `x` therefore name the same entry.
pub trait CacheKey {
    fn cache_key(&self) -> String;
}

impl CacheKey for str {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for Value {
    fn cache_key(&self) -> String {
        cache_key(self)
    }
}

impl CacheKey for EntryHash {
    fn cache_key(&self) -> String {
        self.as_str().to_string()
    }
}

impl<T: CacheKey + ?Sized> CacheKey for &T {
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

macro_rules! impl_cache_key_display {
    ($($ty:ty),*) => {
        $(
            impl CacheKey for $ty {
                fn cache_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_cache_key_display!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char);

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache-enabled lookups answered from the cache.
    pub hits: u64,
    /// Number of cache-enabled lookups that went to the remote.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// String-keyed JSON cache with copy-on-read semantics.
#[derive(Debug, Clone, Default)]
pub struct DbCache {
    entries: HashMap<String, Value>,
    hits: u64,
    misses: u64,
}

impl DbCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    /// Like [`get`](Self::get), but counts the lookup as a hit or miss.
    pub fn lookup(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace every entry with the contents of `value`.
    ///
    /// A JSON object becomes the new mapping. Anything else leaves the cache
    /// empty. Nothing from the previous contents survives either way.
    pub fn replace_with(&mut self, value: &Value) {
        self.entries = match value {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => HashMap::new(),
        };
    }

    /// Owned copy of the whole mapping.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entry_count: self.entries.len() as u64,
        }
    }
}
