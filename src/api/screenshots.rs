use anyhow::Result;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::error::ApiError;
use super::extract::ApiJson;
use super::response::success;
use crate::auth::{extractors::AppState, AuthenticatedAdmin};
use crate::repositories::ProjectRepository;
use crate::services::ScreenshotStatus;

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegenerateRequest {
    #[validate(length(min = 1))]
    pub project_id: String,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new().route("/update-screenshot", post(regenerate_one).patch(regenerate_all));

    Ok(router)
}

async fn regenerate_one(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    ApiJson(req): ApiJson<RegenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate()?;

    let project = ProjectRepository::new(&app_state.database)
        .get(&req.project_id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    if project.live_url().is_none() {
        return Err(ApiError::BadRequest("Project has no live URL".to_string()));
    }

    let result = app_state.screenshots().regenerate(&project).await;
    if let ScreenshotStatus::Error { error } = &result.status {
        return Err(ApiError::Upstream(error.clone()));
    }
    success(result)
}

async fn regenerate_all(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
) -> Result<Json<Value>, ApiError> {
    let report = app_state.screenshots().regenerate_all().await.map_err(ApiError::internal)?;
    success(json!({ "results": report.results, "summary": report.summary }))
}
