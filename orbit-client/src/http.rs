//! HTTP transport for the remote database service.

use std::time::Duration;

use async_trait::async_trait;
use orbit_core::{Connection, Method, RemoteError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::{AuthConfig, ClientConfig, ClientConfigError};

#[derive(Debug, thiserror::Error)]
pub enum HttpConnectionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Config(#[from] ClientConfigError),
    #[error("Invalid header value for {header}: {reason}")]
    InvalidHeader { header: &'static str, reason: String },
}

/// [`Connection`] over HTTP using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpConnection {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl HttpConnection {
    pub fn new(config: &ClientConfig) -> Result<Self, HttpConnectionError> {
        config.validate()?;
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a service-relative path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, RemoteError> {
        let url = self.url_for(path);
        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        }
        .headers(self.auth_header.clone());

        match (method, payload) {
            (Method::Post, Some(body)) => request = request.json(body),
            (_, Some(query)) => request = request.query(query),
            (_, None) => {}
        }

        tracing::debug!(method = %method, path, "Remote call");

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(method, path, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(method, path, e))?;

        if !status.is_success() {
            tracing::warn!(
                method = %method,
                path,
                status = status.as_u16(),
                "Remote call failed"
            );
            return Err(RemoteError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(parse_body(&text))
    }
}

fn transport_error(method: Method, path: &str, error: reqwest::Error) -> RemoteError {
    tracing::warn!(method = %method, path, error = %error, "Remote call failed");
    RemoteError::Transport {
        path: path.to_string(),
        reason: error.to_string(),
    }
}

/// Decode a success body.
///
/// Empty bodies (including 204) decode to `null`. Bodies that are not JSON,
/// such as a bare entry hash, decode to a JSON string of the text.
pub(crate) fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

/// Pull the service's message out of an error body.
pub(crate) fn error_message(text: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        for field in ["error", "message"] {
            if let Some(Value::String(message)) = map.get(field) {
                return message.clone();
            }
        }
    }
    text.trim().to_string()
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, HttpConnectionError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| HttpConnectionError::InvalidHeader {
                header: "x-api-key",
                reason: e.to_string(),
            })?,
        );
    }
    if let Some(jwt) = &auth.jwt {
        let value = format!("Bearer {}", jwt);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| HttpConnectionError::InvalidHeader {
                header: "authorization",
                reason: e.to_string(),
            })?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_for_joins_with_single_slash() {
        let conn = HttpConnection::new(&ClientConfig::new("http://localhost:3000/")).unwrap();
        assert_eq!(conn.base_url(), "http://localhost:3000");
        assert_eq!(conn.url_for("db/abc"), "http://localhost:3000/db/abc");
        assert_eq!(conn.url_for("/db/abc/put"), "http://localhost:3000/db/abc/put");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = ClientConfig::new("http://localhost:3000");
        config.request_timeout_ms = 0;
        assert!(matches!(
            HttpConnection::new(&config),
            Err(HttpConnectionError::Config(_))
        ));
    }

    #[test]
    fn test_auth_headers() {
        let auth = AuthConfig {
            api_key: Some("k".to_string()),
            jwt: Some("t".to_string()),
        };
        let headers = build_auth_headers(&auth).unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "k");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer t");

        let bad = AuthConfig {
            api_key: Some("bad\nkey".to_string()),
            jwt: None,
        };
        assert!(matches!(
            build_auth_headers(&bad),
            Err(HttpConnectionError::InvalidHeader { header: "x-api-key", .. })
        ));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body("{\"a\": 1}"), json!({"a": 1}));
        assert_eq!(parse_body("\"zdpu\""), json!("zdpu"));
        assert_eq!(parse_body("zdpuAx1"), json!("zdpuAx1"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message("{\"error\": \"not found\"}"), "not found");
        assert_eq!(error_message("{\"message\": \"bad\"}"), "bad");
        assert_eq!(error_message("plain failure\n"), "plain failure");
        assert_eq!(error_message("{\"code\": 5}"), "{\"code\": 5}");
    }
}
