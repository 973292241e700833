use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use super::response::success;
use crate::auth::{extractors::AppState, AuthenticatedAdmin, VerifiedAdmin};
use crate::services::is_valid_folder;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub folder: Option<String>,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/stats", get(media_stats))
        .route("/screenshots", delete(reset_screenshots))
        .route("/upload", post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)));

    Ok(router)
}

async fn media_stats(State(app_state): State<AppState>, _admin: AuthenticatedAdmin) -> Result<Json<Value>, ApiError> {
    let stats = app_state.media().stats().await.map_err(ApiError::upstream)?;
    success(json!({ "stats": stats }))
}

/// Deletes every screenshot on the CDN and clears the pair on every project.
async fn reset_screenshots(State(app_state): State<AppState>, verified: VerifiedAdmin) -> Result<Json<Value>, ApiError> {
    info!("Screenshot reset requested by {}", verified.admin.email);
    let cleanup = app_state.media().reset_screenshots().await.map_err(ApiError::upstream)?;
    success(cleanup)
}

async fn upload_image(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let folder = query.folder.unwrap_or_else(|| "certificates".to_string());
    if !is_valid_folder(&folder) {
        return Err(ApiError::BadRequest(format!("Invalid folder name: {}", folder)));
    }
    if body.is_empty() {
        return Err(ApiError::BadRequest("Image body is empty".to_string()));
    }

    let uploaded = app_state.media().upload(&body, &folder).await.map_err(ApiError::upstream)?;
    Ok((StatusCode::CREATED, success(uploaded)?))
}
