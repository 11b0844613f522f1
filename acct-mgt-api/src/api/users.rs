//! Composite user endpoints

use super::{optional_json, ApiResult, Reply};
use crate::error::ApiError;
use crate::kubernetes::cluster_resources::users::{
    ensure_user, observe, remove_user, CreateOutcome, DeleteOutcome, UserIdentity,
};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Optional identity of a composite user.
///
/// Sent as the JSON body of PUT/DELETE and as query parameters on GET.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub full_name: Option<String>,
    pub identity_provider: Option<String>,
    pub provider_user_name: Option<String>,
}

impl UserRequest {
    fn into_identity(self, username: &str, default_provider: &str) -> UserIdentity {
        let provider = self
            .identity_provider
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_provider.to_string());

        let mut identity = UserIdentity::new(username, provider);
        if let Some(full_name) = self.full_name {
            identity = identity.with_full_name(full_name);
        }
        if let Some(provider_user) = self.provider_user_name.filter(|u| !u.is_empty()) {
            identity = identity.with_provider_user(provider_user);
        }
        identity
    }
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Query(request): Query<UserRequest>,
) -> ApiResult {
    let identity = request.into_identity(&user, state.default_provider());
    let status = observe(state.cluster.as_ref(), &identity).await?;

    if status.is_complete() {
        return Ok(Reply::ok(format!("user ({}) exists", user)));
    }
    if status.is_absent() {
        return Err(ApiError::BadRequest(format!("user ({}) does not exist", user)));
    }

    let missing: Vec<String> = status.missing().iter().map(ToString::to_string).collect();
    Err(ApiError::BadRequest(format!(
        "user ({}) is incomplete, missing: {}",
        user,
        missing.join(", ")
    )))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Bytes,
) -> ApiResult {
    let request: UserRequest = optional_json(&body)?;
    let identity = request.into_identity(&user, state.default_provider());

    match ensure_user(state.cluster.as_ref(), &identity).await? {
        CreateOutcome::AlreadyExisted => Ok(Reply::ok(format!("user currently exists ({})", user))),
        CreateOutcome::Created { created } => {
            info!(%user, ?created, "user created");
            Ok(Reply::ok(format!("user created ({})", user)))
        }
    }
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    body: Bytes,
) -> ApiResult {
    let request: UserRequest = optional_json(&body)?;
    let identity = request.into_identity(&user, state.default_provider());

    match remove_user(state.cluster.as_ref(), &identity).await? {
        DeleteOutcome::AlreadyAbsent => Ok(Reply::ok(format!(
            "user does not currently exist ({})",
            user
        ))),
        DeleteOutcome::Deleted { deleted } => {
            info!(%user, ?deleted, "user deleted");
            Ok(Reply::ok(format!("user deleted ({})", user)))
        }
    }
}
