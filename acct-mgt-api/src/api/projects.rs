//! Project endpoints
//!
//! Served both at `/projects/:project` and `/projects/:project/owner/:user`;
//! the owner is only used when creating.

use super::{optional_json, ApiResult, Reply};
use crate::error::ApiError;
use crate::kubernetes::cluster_resources::projects::{self, NewProject};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ProjectPath {
    pub project: String,
    pub user: Option<String>,
}

/// Optional body of PUT /projects/:project
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRequest {
    pub display_name: Option<String>,
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ProjectPath>,
) -> ApiResult {
    if projects::project_exists(state.cluster.as_ref(), &path.project).await? {
        return Ok(Reply::ok(format!("project exists ({})", path.project)));
    }
    Err(ApiError::BadRequest(format!(
        "project does not exist ({})",
        path.project
    )))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ProjectPath>,
    body: Bytes,
) -> ApiResult {
    let request: ProjectRequest = optional_json(&body)?;
    let project = NewProject {
        name: path.project.clone(),
        display_name: request.display_name,
        owner: path.user,
    };

    if projects::create_project(state.cluster.as_ref(), &project).await? {
        Ok(Reply::ok(format!("project created ({})", path.project)))
    } else {
        Err(ApiError::BadRequest(format!(
            "project currently exist ({})",
            path.project
        )))
    }
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ProjectPath>,
) -> ApiResult {
    if projects::delete_project(state.cluster.as_ref(), &path.project).await? {
        Ok(Reply::ok(format!("project deleted ({})", path.project)))
    } else {
        Err(ApiError::BadRequest(format!(
            "unable to delete, project does not exist ({})",
            path.project
        )))
    }
}
