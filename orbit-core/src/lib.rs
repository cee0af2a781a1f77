//! Orbit core types.
//!
//! Shared building blocks for talking to a remote append-only database
//! service: the parameters describing one database, the per-handle read
//! cache, index field lookup, entry identifiers, the error taxonomy, and the
//! [`Connection`] contract every transport implements.

pub mod cache;
pub mod connection;
pub mod entry;
pub mod error;
pub mod field;
pub mod params;

pub use cache::{cache_key, CacheKey, CacheStats, DbCache};
pub use connection::{Connection, Method};
pub use entry::EntryHash;
pub use error::{ConfigError, FieldAccessError, OrbitError, OrbitResult, RemoteError};
pub use field::{index_value, FieldAccess};
pub use params::{Capabilities, DbParams, CAPABILITY_PUT, CAPABILITY_QUERY};
