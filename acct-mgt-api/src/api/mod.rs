//! HTTP facade
//!
//! Builds the Axum router. Every response is a JSON object with a `msg`
//! field; handlers add their payload next to it.

pub mod projects;
pub mod quotas;
pub mod roles;
pub mod users;

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        });

    Router::new()
        .route(
            "/users/:user",
            get(users::get_user)
                .put(users::create_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/:user/projects/:project/roles/:role",
            get(roles::get_role)
                .put(roles::add_role)
                .delete(roles::remove_role),
        )
        .route(
            "/projects/:project",
            get(projects::get_project)
                .put(projects::create_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/:project/owner/:user",
            get(projects::get_project)
                .put(projects::create_project)
                .delete(projects::delete_project),
        )
        .route(
            "/quota/:project/resourcequota/:resource",
            get(quotas::get_quota).delete(quotas::delete_quota),
        )
        .route("/quotas/:project", get(quotas::list_quotas))
        .route("/quota/:project/:resource", post(quotas::create_quota))
        .route(
            "/update-quota/:project/resourcequota/:resource",
            patch(quotas::update_quota),
        )
        .layer(trace_layer)
        .with_state(state)
}

/// JSON response body: `msg` plus optional extra fields
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: Map<String, Value>,
}

impl Reply {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, msg)
    }

    pub fn with_status(status: StatusCode, msg: impl Into<String>) -> Self {
        let mut body = Map::new();
        body.insert("msg".to_string(), Value::String(msg.into()));
        Self { status, body }
    }

    /// Add a field next to `msg`
    pub fn field(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.body.insert(key.to_string(), value);
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

pub type ApiResult = Result<Reply, ApiError>;

/// Decode an optional JSON body; an empty body yields the default
pub(crate) fn optional_json<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}
