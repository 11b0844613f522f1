//! Error handling for API responses
//!
//! Every error body has the same shape as a success body: a JSON object with
//! a `msg` field, plus `suggested name` when a project name was rejected.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub msg: String,

    #[serde(rename = "suggested name", skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            suggested_name: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggested_name = suggestion;
        self
    }
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// 400, the request cannot be applied
    BadRequest(String),

    /// 404
    NotFound(String),

    /// 400 with a corrected name to retry with
    InvalidProjectName {
        message: String,
        suggestion: Option<String>,
    },

    /// 400, the cluster API could not be reached or gave an unexpected answer
    Backend(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::InvalidProjectName { .. } | ApiError::Backend(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) | ApiError::Backend(msg) => {
                ErrorResponse::new(msg.clone())
            }
            ApiError::InvalidProjectName {
                message,
                suggestion,
            } => ErrorResponse::new(message.clone()).with_suggestion(suggestion.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_error_response())).into_response()
    }
}

impl From<acct_mgt_common::Error> for ApiError {
    fn from(err: acct_mgt_common::Error) -> Self {
        match err {
            acct_mgt_common::Error::InvalidProjectName { ref suggestion, .. } => {
                ApiError::InvalidProjectName {
                    message: format!("ERROR: {}", err),
                    suggestion: suggestion.clone(),
                }
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}
