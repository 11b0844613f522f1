//! Reconcilers for the resources acct-mgt manages
//!
//! Handles Projects, composite Users, RoleBindings and ResourceQuotas. Every
//! operation re-reads the backend and issues its calls strictly in sequence.

pub mod projects;
pub mod quotas;
pub mod rolebindings;
pub mod users;

use crate::error::ApiError;
use crate::kubernetes::error::K8sError;
use crate::kubernetes::types::{Mutation, ResourceKey, ResourceKind, Verb};
use thiserror::Error;

/// Failures of a reconcile step
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The backend answered a mutation with a non-2xx status
    #[error("unable to {verb} {kind} ({name}): {message}")]
    Rejected {
        verb: Verb,
        kind: ResourceKind,
        name: String,
        status: u16,
        message: String,
    },

    /// The request cannot be applied to the current backend state
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Cluster(#[from] K8sError),

    #[error(transparent)]
    Domain(#[from] acct_mgt_common::Error),
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

/// Turn a non-2xx mutation into [`ReconcileError::Rejected`]
pub(crate) fn accepted(
    verb: Verb,
    kind: ResourceKind,
    key: &ResourceKey,
    mutation: Mutation,
) -> ReconcileResult<Mutation> {
    if mutation.is_success() {
        tracing::info!(%verb, %kind, name = %key, status = mutation.status, "mutation applied");
        return Ok(mutation);
    }

    tracing::warn!(%verb, %kind, name = %key, status = mutation.status, "mutation rejected");
    let message = match mutation.message() {
        m if m.is_empty() => format!("cluster API returned {}", mutation.status),
        m => m,
    };
    Err(ReconcileError::Rejected {
        verb,
        kind,
        name: key.name.clone(),
        status: mutation.status,
        message,
    })
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Cluster(e) => e.into(),
            ReconcileError::Domain(e) => e.into(),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_mutation_carries_backend_message() {
        let key = ResourceKey::cluster("alice");
        let err = accepted(
            Verb::Create,
            ResourceKind::User,
            &key,
            Mutation::new(409, json!({"message": "users \"alice\" already exists"})),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "unable to create user (alice): users \"alice\" already exists"
        );
        assert!(matches!(err, ReconcileError::Rejected { status: 409, .. }));
    }

    #[test]
    fn test_rejected_mutation_without_body() {
        let key = ResourceKey::cluster("alice");
        let err = accepted(
            Verb::Delete,
            ResourceKind::Identity,
            &key,
            Mutation::new(500, serde_json::Value::Null),
        )
        .unwrap_err();
        assert!(err.to_string().ends_with("cluster API returned 500"));
    }

    #[test]
    fn test_successful_mutation_passes_through() {
        let key = ResourceKey::cluster("p1");
        let mutation = accepted(
            Verb::Delete,
            ResourceKind::Project,
            &key,
            Mutation::new(200, json!({})),
        )
        .unwrap();
        assert_eq!(mutation.status, 200);
    }
}
