//! Resource quota endpoints

use super::{ApiResult, Reply};
use crate::error::ApiError;
use crate::kubernetes::cluster_resources::quotas::{self, QuotaCreate};
use crate::state::AppState;
use acct_mgt_common::quota::{QuotaPatch, QuotaRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct QuotaPath {
    pub project: String,
    pub resource: String,
}

fn no_such_quota(path: &QuotaPath) -> ApiError {
    ApiError::BadRequest(format!(
        "No such quota exists with ({}) in project ({})",
        path.resource, path.project
    ))
}

/// Map body rejections onto the service's messages
fn json_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    malformed: impl FnOnce() -> ApiError,
) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => {
            Err(ApiError::BadRequest("Input type should be JSON".to_string()))
        }
        Err(JsonRejection::JsonDataError(_)) => Err(malformed()),
        Err(other) => Err(ApiError::BadRequest(other.body_text())),
    }
}

pub async fn get_quota(State(state): State<Arc<AppState>>, Path(path): Path<QuotaPath>) -> ApiResult {
    match quotas::get_hard_limits(state.cluster.as_ref(), &path.project, &path.resource).await? {
        Some(hard) => Ok(Reply::ok(format!("Quota exists for ({})", path.resource))
            .field("specifications", hard)),
        None => Err(ApiError::BadRequest(format!(
            "No quotas with name ({}) in project ({})",
            path.resource, path.project
        ))),
    }
}

pub async fn list_quotas(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
) -> ApiResult {
    let items = quotas::list_quotas(state.cluster.as_ref(), &project).await?;
    Ok(
        Reply::ok(format!("All quotas that exist for project ({})", project))
            .field("quotas", items),
    )
}

pub async fn create_quota(
    State(state): State<Arc<AppState>>,
    Path(path): Path<QuotaPath>,
    payload: Result<Json<QuotaRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(payload, || acct_mgt_common::Error::MalformedQuotaRequest.into())?;
    let outcomes =
        quotas::create_quotas(state.cluster.as_ref(), &path.project, &path.resource, request)
            .await?;

    let messages: Vec<String> = outcomes
        .iter()
        .map(|outcome| match outcome {
            QuotaCreate::Created { spec } => format!(
                "Quota created successfully for the project ({}) and the quota is ({})",
                path.project, spec
            ),
            QuotaCreate::AlreadyExists { spec } => format!(
                "Quota already exists with ({}) in project ({}) and the quota is ({})",
                path.resource, path.project, spec
            ),
            QuotaCreate::Rejected {
                spec, message, ..
            } => format!(
                "Unable to create quota for the project ({}) and the quota is ({}): {}",
                path.project, spec, message
            ),
        })
        .collect();

    let status = if outcomes.iter().all(QuotaCreate::is_created) {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok(Reply::with_status(status, messages.join("; ")))
}

pub async fn update_quota(
    State(state): State<Arc<AppState>>,
    Path(path): Path<QuotaPath>,
    payload: Result<Json<QuotaPatch>, JsonRejection>,
) -> ApiResult {
    let patch = json_body(payload, || {
        ApiError::BadRequest("quota update must contain 'spec.hard'".to_string())
    })?;

    let merged = quotas::update_hard_limits(
        state.cluster.as_ref(),
        &path.project,
        &path.resource,
        &patch.spec.hard,
    )
    .await?
    .ok_or_else(|| no_such_quota(&path))?;

    Ok(Reply::ok("Quota updated with latest specifications")
        .field("updated-specification", merged))
}

pub async fn delete_quota(
    State(state): State<Arc<AppState>>,
    Path(path): Path<QuotaPath>,
) -> ApiResult {
    let metadata = quotas::delete_quota(state.cluster.as_ref(), &path.project, &path.resource)
        .await?
        .ok_or_else(|| no_such_quota(&path))?;

    Ok(Reply::ok("Quota deleted").field("details", metadata))
}
