//! Cluster credentials
//!
//! The bearer token is normally the pod's service account token. The file is
//! opened, read and closed on every call so a rotated token is picked up
//! without restarting the service.

use super::error::{K8sError, K8sResult};
use std::path::PathBuf;

/// Where the bearer token for the cluster API comes from
#[derive(Clone)]
pub enum TokenSource {
    /// Token file mounted into the pod
    File(PathBuf),
    /// Fixed token, for local development and tests
    Static(String),
}

impl TokenSource {
    /// Read the current bearer token
    pub async fn bearer(&self) -> K8sResult<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::File(path) => {
                let token = tokio::fs::read_to_string(path).await.map_err(|source| {
                    K8sError::Credentials {
                        path: path.clone(),
                        source,
                    }
                })?;
                Ok(token.trim().to_string())
            }
        }
    }
}

// Never print the token itself
impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::File(path) => f.debug_tuple("File").field(path).finish(),
            TokenSource::Static(_) => f.debug_tuple("Static").field(&"<redacted>").finish(),
        }
    }
}
