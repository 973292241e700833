use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use super::cookie::expired_cookie;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authentication cookie")]
    MissingToken,
    /// Bad signature, malformed or expired. The response also clears the cookie.
    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String, cookie_name: String, secure: bool },
    #[error("Admin not found")]
    AdminNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailExists,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            AuthError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string()),
            AuthError::AdminNotFound => (StatusCode::UNAUTHORIZED, "Admin not found".to_string()),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()),
            AuthError::EmailExists => (StatusCode::CONFLICT, "Email already exists".to_string()),
            AuthError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
            AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        match &self {
            AuthError::InvalidToken { cookie_name, secure, .. } => {
                let clear = expired_cookie(cookie_name, *secure);
                (status, [(header::SET_COOKIE, clear)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
