//! Role binding endpoints

use super::{ApiResult, Reply};
use crate::error::ApiError;
use crate::kubernetes::cluster_resources::rolebindings::{grant_role, has_role, revoke_role};
use crate::state::AppState;
use acct_mgt_common::Role;
use axum::extract::{Path, State};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RolePath {
    pub user: String,
    pub project: String,
    pub role: String,
}

impl RolePath {
    fn role(&self) -> Result<Role, ApiError> {
        Ok(self.role.parse()?)
    }

    fn describe(&self, role: Role) -> String {
        format!("{},{},{}", self.project, self.user, role)
    }
}

pub async fn get_role(State(state): State<Arc<AppState>>, Path(path): Path<RolePath>) -> ApiResult {
    let role = path.role()?;
    if has_role(state.cluster.as_ref(), &path.project, &path.user, role).await? {
        return Ok(Reply::ok(format!("user role exists ({})", path.describe(role))));
    }
    Err(ApiError::NotFound(format!(
        "user role does not exist ({})",
        path.describe(role)
    )))
}

pub async fn add_role(State(state): State<Arc<AppState>>, Path(path): Path<RolePath>) -> ApiResult {
    let role = path.role()?;
    grant_role(state.cluster.as_ref(), &path.project, &path.user, role).await?;
    Ok(Reply::ok(format!("rolebinding created ({})", path.describe(role))))
}

pub async fn remove_role(
    State(state): State<Arc<AppState>>,
    Path(path): Path<RolePath>,
) -> ApiResult {
    let role = path.role()?;
    revoke_role(state.cluster.as_ref(), &path.project, &path.user, role).await?;
    Ok(Reply::ok(format!("rolebinding deleted ({})", path.describe(role))))
}
