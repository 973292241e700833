use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::database::StoreError;

/// Failures a JSON handler can report. Every variant renders as
/// `{ "success": false, "error": ... }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The renderer or the CDN failed. The message is shown to the operator.
    #[error("Upstream failure: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn upstream(error: anyhow::Error) -> Self {
        ApiError::Upstream(format!("{:#}", error))
    }

    pub fn internal(error: impl std::fmt::Display) -> Self {
        ApiError::Internal(error.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::InvalidId(id) => ApiError::BadRequest(format!("Invalid id: {}", id)),
            StoreError::Duplicate => ApiError::Conflict("Duplicate key".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|field| field.to_string()).collect();
        fields.sort();
        ApiError::Validation(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": format!("Missing required fields: {}", fields.join(", ")),
                    "fields": fields,
                }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"success": false, "error": msg})),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({"success": false, "error": format!("{} not found", what)}),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({"success": false, "error": msg})),
            ApiError::Upstream(msg) => {
                error!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, json!({"success": false, "error": msg}))
            }
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"success": false, "error": "Internal server error"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
