//! Contract for the remote connection a database handle talks through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RemoteError;

/// Request method understood by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote call collaborator.
///
/// `path` is a slash-joined route relative to the service root, such as
/// `db/<id>/put`. `payload` is the JSON body for [`Method::Post`] and the
/// query parameters for [`Method::Get`]. Implementations own transport,
/// authentication and timeouts.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Value, RemoteError>;
}
