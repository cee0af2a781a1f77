//! Orbit client.
//!
//! [`DbHandle`] is the client-side accessor for one database hosted by a
//! remote append-only database service. It delegates every durable
//! operation to a [`Connection`] and keeps an optional local read cache.
//! [`HttpConnection`] is the `reqwest`-backed connection used in production.

pub mod config;
pub mod db;
pub mod http;

pub use config::{AuthConfig, ClientConfig, ClientConfigError};
pub use db::{encode_id, DbHandle};
pub use http::{HttpConnection, HttpConnectionError};

pub use orbit_core::{
    CacheKey, CacheStats, Capabilities, ConfigError, Connection, DbParams, EntryHash, FieldAccess,
    FieldAccessError, Method, OrbitError, OrbitResult, RemoteError,
};
