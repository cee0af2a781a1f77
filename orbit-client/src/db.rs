//! Database handle.
//!
//! A [`DbHandle`] wraps one remote database: its parameters, the path-safe
//! form of its identifier, and a local read cache owned by this handle
//! alone. Every operation awaits at most one remote call. Cache contents only
//! change after the remote call succeeded, except the index pre-store in
//! [`DbHandle::put`] which happens before the write is sent.
//!
//! # Example
//!
//! ```ignore
//! let conn = Arc::new(HttpConnection::new(&config)?);
//! let params = DbParams::from_value(info)?;
//! let mut db = DbHandle::new(conn, params, config.use_db_cache)?;
//!
//! let hash = db.put(&json!({"name": "x", "v": 1}), None).await?;
//! let entry = db.get(&hash, Some(true)).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use orbit_core::{
    cache_key, index_value, CacheKey, CacheStats, Connection, DbCache, DbParams, EntryHash,
    FieldAccess, Method, OrbitResult, RemoteError, CAPABILITY_PUT, CAPABILITY_QUERY,
};
use serde::Serialize;
use serde_json::Value;

/// Client-side handle for one remote database.
pub struct DbHandle<C: Connection + ?Sized> {
    connection: Arc<C>,
    params: DbParams,
    id_safe: String,
    use_cache: bool,
    cache: DbCache,
}

impl<C: Connection + ?Sized> DbHandle<C> {
    /// Build a handle, rejecting incomplete parameters.
    ///
    /// `use_cache` is the default for operations called without an explicit
    /// cache flag.
    pub fn new(connection: Arc<C>, params: DbParams, use_cache: bool) -> OrbitResult<Self> {
        params.validate()?;
        let id_safe = encode_id(&params.id);
        Ok(Self {
            connection,
            params,
            id_safe,
            use_cache,
            cache: DbCache::new(),
        })
    }

    /// Build a handle from the service's loosely-typed database description.
    pub fn from_value(connection: Arc<C>, params: Value, use_cache: bool) -> OrbitResult<Self> {
        let params = DbParams::from_value(params)?;
        Self::new(connection, params, use_cache)
    }

    // ------------------------------------------------------------------------
    // Local cache
    // ------------------------------------------------------------------------

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Copy of the cached value for `key`. Never calls the remote.
    pub fn cache_get<K: CacheKey + ?Sized>(&self, key: &K) -> Option<Value> {
        self.cache.get(&key.cache_key())
    }

    pub fn cache_remove<K: CacheKey + ?Sized>(&mut self, key: &K) {
        self.cache.remove(&key.cache_key());
    }

    /// Copy of the whole cache.
    pub fn cache(&self) -> HashMap<String, Value> {
        self.cache.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Copy of the configuration this handle was built from.
    pub fn params(&self) -> DbParams {
        self.params.clone()
    }

    pub fn dbname(&self) -> &str {
        &self.params.dbname
    }

    pub fn dbtype(&self) -> &str {
        &self.params.db_type
    }

    pub fn id(&self) -> &str {
        &self.params.id
    }

    pub fn id_safe(&self) -> &str {
        &self.id_safe
    }

    pub fn index_by(&self) -> Option<&str> {
        self.params.index_by.as_deref()
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn queryable(&self) -> bool {
        self.params.has_capability(CAPABILITY_QUERY)
    }

    pub fn putable(&self) -> bool {
        self.params.has_capability(CAPABILITY_PUT)
    }

    // ------------------------------------------------------------------------
    // Remote operations
    // ------------------------------------------------------------------------

    /// Database information, straight from the service.
    pub async fn info(&self) -> Result<Value, RemoteError> {
        self.call(Method::Get, &self.endpoint(&[]), None).await
    }

    /// Read the entry stored under `key`.
    ///
    /// With caching enabled a cached value is returned without a remote
    /// call, and a fetched value is stored before it is returned. The result
    /// is always an owned copy.
    pub async fn get<K: CacheKey + ?Sized>(
        &mut self,
        key: &K,
        cache: Option<bool>,
    ) -> OrbitResult<Value> {
        let use_cache = self.resolve_cache(cache);
        let key = key.cache_key();

        if use_cache {
            if let Some(value) = self.cache.lookup(&key) {
                tracing::debug!(db = %self.params.dbname, key = %key, "Cache hit");
                return Ok(value);
            }
            tracing::debug!(db = %self.params.dbname, key = %key, "Cache miss");
        }

        let path = self.endpoint(&[key.as_str()]);
        let result = self.call(Method::Get, &path, None).await?;
        if use_cache {
            self.cache.insert(key, result.clone());
        }
        Ok(result)
    }

    /// Raw entry for `key`. Bypasses the cache.
    pub async fn get_raw<K: CacheKey + ?Sized>(&self, key: &K) -> Result<Value, RemoteError> {
        let key = key.cache_key();
        self.call(Method::Get, &self.endpoint(&["raw", key.as_str()]), None)
            .await
    }

    /// Write `item` with `put` and return the new entry's hash.
    ///
    /// With caching enabled and an index field configured, the item is
    /// stored under its index value before the write is sent; a missing
    /// index field fails the call before anything is sent. After a
    /// successful write the item is also stored under the entry hash.
    pub async fn put<I>(&mut self, item: &I, cache: Option<bool>) -> OrbitResult<EntryHash>
    where
        I: Serialize + FieldAccess + ?Sized,
    {
        let use_cache = self.resolve_cache(cache);
        let payload = serde_json::to_value(item)?;

        if use_cache {
            if let Some(field) = self.params.index_by.as_deref() {
                let index = cache_key(&index_value(item, field)?);
                tracing::debug!(db = %self.params.dbname, index = %index, "Caching item by index");
                self.cache.insert(index, payload.clone());
            }
        }

        let hash = self.write("put", &payload).await?;
        if use_cache {
            self.cache.insert(hash.as_str(), payload);
        }
        Ok(hash)
    }

    /// Append `item` with `add` and return the new entry's hash.
    pub async fn add<I>(&mut self, item: &I, cache: Option<bool>) -> OrbitResult<EntryHash>
    where
        I: Serialize + ?Sized,
    {
        let use_cache = self.resolve_cache(cache);
        let payload = serde_json::to_value(item)?;

        let hash = self.write("add", &payload).await?;
        if use_cache {
            self.cache.insert(hash.as_str(), payload);
        }
        Ok(hash)
    }

    pub async fn iterator_raw<Q>(&self, query: &Q) -> OrbitResult<Value>
    where
        Q: Serialize + ?Sized,
    {
        let query = serde_json::to_value(query)?;
        Ok(self
            .call(Method::Get, &self.endpoint(&["rawiterator"]), Some(&query))
            .await?)
    }

    pub async fn iterator<Q>(&self, query: &Q) -> OrbitResult<Value>
    where
        Q: Serialize + ?Sized,
    {
        let query = serde_json::to_value(query)?;
        Ok(self
            .call(Method::Get, &self.endpoint(&["iterator"]), Some(&query))
            .await?)
    }

    /// Fetch the database index and make it the whole cache.
    ///
    /// Previous cache entries are dropped, not merged.
    pub async fn index(&mut self) -> Result<Value, RemoteError> {
        let result = self.call(Method::Get, &self.endpoint(&["index"]), None).await?;
        self.cache.replace_with(&result);
        tracing::debug!(
            db = %self.params.dbname,
            entries = self.cache.len(),
            "Cache replaced from index"
        );
        Ok(result)
    }

    /// Ask the service to unload this database. The local cache is kept.
    pub async fn unload(&self) -> Result<Value, RemoteError> {
        self.call(Method::Delete, &self.endpoint(&[]), None).await
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn resolve_cache(&self, cache: Option<bool>) -> bool {
        cache.unwrap_or(self.use_cache)
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let mut path = format!("db/{}", self.id_safe);
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    async fn write(&self, op: &str, payload: &Value) -> OrbitResult<EntryHash> {
        let path = self.endpoint(&[op]);
        let response = self.call(Method::Post, &path, Some(payload)).await?;
        EntryHash::from_response(&response).ok_or_else(|| {
            RemoteError::InvalidResponse {
                path,
                reason: format!("expected an entry hash, got {}", response),
            }
            .into()
        })
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        tracing::debug!(db = %self.params.dbname, method = %method, path, "Database call");
        self.connection.call(method, path, payload).await
    }
}

impl<C: Connection + ?Sized> std::fmt::Debug for DbHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle")
            .field("dbname", &self.params.dbname)
            .field("id", &self.params.id)
            .field("type", &self.params.db_type)
            .field("use_cache", &self.use_cache)
            .field("cached_entries", &self.cache.len())
            .finish()
    }
}

/// Percent-encode a database identifier for use as one path segment.
///
/// Everything except ASCII alphanumerics and `-_.~` is escaped, `/` included.
pub fn encode_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_id_escapes_slashes() {
        assert_eq!(
            encode_id("/orbitdb/zdpuAm/feed"),
            "%2Forbitdb%2FzdpuAm%2Ffeed"
        );
        assert_eq!(encode_id("a b:c"), "a%20b%3Ac");
        assert_eq!(encode_id("plain-id_1.~"), "plain-id_1.~");
    }
}
