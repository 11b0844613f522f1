//! Kubernetes error types and ApiError mapping
//!
//! Only failures to get an answer out of the cluster API are errors here. A
//! 404 on a probe is a negative answer and a rejected mutation is a
//! [`Mutation`](super::types::Mutation) with a non-2xx status.

use super::types::ResourceKind;
use crate::error::ApiError;
use std::path::PathBuf;
use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// Transport-level failure talking to the cluster API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A read returned something other than success or 404
    #[error("cluster API returned {status} for {kind} '{name}': {message}")]
    UnexpectedStatus {
        kind: ResourceKind,
        name: String,
        status: u16,
        message: String,
    },

    /// Response body was not the expected JSON document
    #[error("invalid response payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Service account token could not be read
    #[error("unable to read cluster token from {}: {source}", path.display())]
    Credentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token contains bytes that cannot be sent in a header
    #[error("cluster token is not a valid bearer header value")]
    InvalidToken,

    /// Cluster URL is not usable
    #[error("invalid cluster URL: {0}")]
    InvalidUrl(String),
}

impl From<K8sError> for ApiError {
    fn from(err: K8sError) -> Self {
        tracing::warn!(error = %err, "cluster API call failed");
        match err {
            K8sError::UnexpectedStatus {
                kind, name, status, ..
            } => ApiError::Backend(format!(
                "unable to determine state of {} ({}): cluster API returned {}",
                kind, name, status
            )),
            other => ApiError::Backend(other.to_string()),
        }
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;
