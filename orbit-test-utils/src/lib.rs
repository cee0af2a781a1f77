//! Orbit Test Utilities
//!
//! Centralized test infrastructure for the orbit workspace:
//! - A scripted mock [`Connection`] that records every call
//! - Proptest generators for keys, JSON values, hashes, and parameters
//! - Fixtures for common database shapes

pub use orbit_core::{
    Capabilities, Connection, DbParams, EntryHash, Method, RemoteError, CAPABILITY_PUT,
    CAPABILITY_QUERY,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

// ============================================================================
// MOCK CONNECTION
// ============================================================================

/// One call observed by [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub payload: Option<Value>,
}

type RouteKey = (Method, String);

/// Mock connection with per-route scripted responses.
///
/// Responses queued with [`respond_once`](Self::respond_once) are consumed in
/// order before falling back to the sticky response set by
/// [`respond`](Self::respond). Unscripted routes fail with a 404 status.
#[derive(Debug, Default)]
pub struct MockConnection {
    queued: Mutex<HashMap<RouteKey, VecDeque<Result<Value, RemoteError>>>>,
    sticky: Mutex<HashMap<RouteKey, Result<Value, RemoteError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `method path` with `value`.
    pub fn respond(&self, method: Method, path: impl Into<String>, value: Value) -> &Self {
        lock(&self.sticky).insert((method, path.into()), Ok(value));
        self
    }

    /// Answer the next call to `method path` with `value`.
    pub fn respond_once(&self, method: Method, path: impl Into<String>, value: Value) -> &Self {
        lock(&self.queued)
            .entry((method, path.into()))
            .or_default()
            .push_back(Ok(value));
        self
    }

    /// Fail every call to `method path` with `error`.
    pub fn fail(&self, method: Method, path: impl Into<String>, error: RemoteError) -> &Self {
        lock(&self.sticky).insert((method, path.into()), Err(error));
        self
    }

    /// Every call seen so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of calls made to `method path`.
    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        lock(&self.calls).last().cloned()
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_response(&self, method: Method, path: &str) -> Result<Value, RemoteError> {
        let key = (method, path.to_string());
        if let Some(response) = lock(&self.queued).get_mut(&key).and_then(VecDeque::pop_front) {
            return response;
        }
        lock(&self.sticky)
            .get(&key)
            .cloned()
            .unwrap_or_else(|| {
                Err(RemoteError::Status {
                    path: path.to_string(),
                    status: 404,
                    message: format!("no mock response for {} {}", method, path),
                })
            })
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        lock(&self.calls).push(RecordedCall {
            method,
            path: path.to_string(),
            payload: payload.cloned(),
        });
        self.next_response(method, path)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Parameter fixtures. Identifiers contain only path-safe characters so
    //! tests can spell request paths literally.

    use super::*;

    pub const FEED_ID: &str = "feed-id";
    pub const DOCS_ID: &str = "docs-id";

    /// Append-only feed: `add` only, no index field.
    pub fn feed_params() -> DbParams {
        DbParams::new("feed", FEED_ID, "feed").with_capabilities(["add", "get", "iterator"])
    }

    /// Document store indexed by `field`, queryable and putable.
    pub fn docstore_params(field: &str) -> DbParams {
        DbParams::new("docs", DOCS_ID, "docstore")
            .with_capabilities([CAPABILITY_QUERY, CAPABILITY_PUT, "get"])
            .with_index_by(field)
    }

    /// `db/<id>` followed by `segments`, slash-joined.
    pub fn db_path(id: &str, segments: &[&str]) -> String {
        let mut path = format!("db/{}", id);
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for orbit types.

    use super::*;
    use proptest::prelude::*;

    /// Cache/entry key made of path-safe characters.
    pub fn arb_key() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-]{1,24}"
    }

    /// Entry hash in the shape the service returns.
    pub fn arb_entry_hash() -> impl Strategy<Value = EntryHash> {
        "zdpu[A-Za-z0-9]{20,40}".prop_map(EntryHash::new)
    }

    /// JSON scalar (null, bool, integer, string).
    pub fn arb_json_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::from),
            ".{0,16}".prop_map(Value::String),
        ]
    }

    /// Arbitrary JSON value up to a few levels deep.
    pub fn arb_json_value() -> impl Strategy<Value = Value> {
        arb_json_scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    /// JSON object carrying `field` as a string, plus arbitrary other fields.
    pub fn arb_indexed_item(field: &'static str) -> impl Strategy<Value = (String, Value)> {
        (
            "[a-z0-9]{1,12}",
            prop::collection::btree_map("[A-Z]{1,6}", arb_json_scalar(), 0..4),
        )
            .prop_map(move |(index, rest)| {
                let mut map: serde_json::Map<String, Value> = rest.into_iter().collect();
                map.insert(field.to_string(), Value::String(index.clone()));
                (index, Value::Object(map))
            })
    }

    /// Capability set drawn from the names the service uses.
    pub fn arb_capabilities() -> impl Strategy<Value = Capabilities> {
        prop::sample::subsequence(vec!["query", "put", "add", "get", "iterator", "del"], 0..=6)
            .prop_map(|names| names.into_iter().collect())
    }

    /// Valid database parameters.
    pub fn arb_db_params() -> impl Strategy<Value = DbParams> {
        (
            "[a-z]{1,12}",
            "[A-Za-z0-9/._-]{1,32}",
            prop_oneof![
                Just("feed"),
                Just("eventlog"),
                Just("docstore"),
                Just("keyvalue"),
                Just("counter"),
            ],
            arb_capabilities(),
        )
            .prop_filter("id must not be blank", |(_, id, _, _)| !id.trim().is_empty())
            .prop_map(|(dbname, id, db_type, capabilities)| {
                let mut params = DbParams::new(dbname, id, db_type);
                params.capabilities = capabilities;
                params
            })
    }
}
