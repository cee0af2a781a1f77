//! Error types for orbit database handle operations

use thiserror::Error;

/// Configuration errors raised while building a database handle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failures reported by a [`Connection`](crate::Connection).
///
/// The handle never inspects or rewrites these, it hands them back to the
/// caller exactly as the connection produced them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport failure on {path}: {reason}")]
    Transport { path: String, reason: String },

    #[error("Remote returned status {status} for {path}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {path}: {reason}")]
    InvalidResponse { path: String, reason: String },
}

impl RemoteError {
    /// Path of the request that failed.
    pub fn path(&self) -> &str {
        match self {
            RemoteError::Transport { path, .. }
            | RemoteError::Status { path, .. }
            | RemoteError::InvalidResponse { path, .. } => path,
        }
    }
}

/// Index field lookup errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldAccessError {
    #[error("Index field missing on item: {field}")]
    Missing { field: String },
}

/// Master error type for all orbit client errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrbitError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Field access error: {0}")]
    FieldAccess(#[from] FieldAccessError),

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl From<serde_json::Error> for OrbitError {
    fn from(err: serde_json::Error) -> Self {
        OrbitError::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for orbit operations.
pub type OrbitResult<T> = Result<T, OrbitError>;

// =============================================================================
// TESTS
// =============================================================================
