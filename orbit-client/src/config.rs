//! Configuration loading for the orbit client.
//!
//! All fields are required unless explicitly marked optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV_VAR: &str = "ORBIT_CLIENT_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// Default cache flag for handles opened with this config.
    #[serde(default)]
    pub use_db_cache: bool,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientConfigError {
    #[error("Missing configuration file path (use --config or ORBIT_CLIENT_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout_ms: 30_000,
            use_db_cache: false,
            auth: AuthConfig::default(),
        }
    }

    pub fn load() -> Result<Self, ClientConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ClientConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ClientConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ClientConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ClientConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if matches!(self.auth.api_key.as_deref(), Some(key) if key.trim().is_empty()) {
            return Err(ClientConfigError::InvalidValue {
                field: "auth.api_key",
                reason: "must not be empty when set".to_string(),
            });
        }
        if matches!(self.auth.jwt.as_deref(), Some(jwt) if jwt.trim().is_empty()) {
            return Err(ClientConfigError::InvalidValue {
                field: "auth.jwt",
                reason: "must not be empty when set".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
