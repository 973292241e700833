use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::error::ApiError;
use super::extract::ApiJson;
use super::response::success;
use crate::auth::{extractors::AppState, AuthenticatedAdmin};
use crate::models::ExperienceInput;
use crate::repositories::ExperienceRepository;

#[derive(Debug, Deserialize, Validate, Default)]
#[serde(default)]
pub struct ReorderRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<String>,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_experiences).post(create_experience))
        .route("/reorder", put(reorder_experiences))
        .route("/{id}", get(get_experience).put(update_experience).delete(delete_experience))
        .route("/{id}/toggle-publish", patch(toggle_publish));

    Ok(router)
}

async fn list_experiences(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
) -> Result<Json<Value>, ApiError> {
    let experiences = ExperienceRepository::new(&app_state.database).list().await?;
    success(json!({ "experiences": experiences }))
}

async fn get_experience(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let experience = ExperienceRepository::new(&app_state.database)
        .get(&id)
        .await?
        .ok_or(ApiError::NotFound("Experience"))?;
    success(json!({ "experience": experience }))
}

async fn create_experience(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    ApiJson(input): ApiJson<ExperienceInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    input.validate()?;

    let experience = ExperienceRepository::new(&app_state.database).create(input).await?;
    Ok((StatusCode::CREATED, success(json!({ "experience": experience }))?))
}

async fn update_experience(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ExperienceInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate()?;

    let experience = ExperienceRepository::new(&app_state.database)
        .update(&id, input)
        .await?
        .ok_or(ApiError::NotFound("Experience"))?;
    success(json!({ "experience": experience }))
}

async fn delete_experience(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !ExperienceRepository::new(&app_state.database).delete(&id).await? {
        return Err(ApiError::NotFound("Experience"));
    }
    success(json!({}))
}

async fn toggle_publish(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let is_published = ExperienceRepository::new(&app_state.database)
        .toggle_publish(&id)
        .await?
        .ok_or(ApiError::NotFound("Experience"))?;
    success(json!({ "isPublished": is_published }))
}

async fn reorder_experiences(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    ApiJson(req): ApiJson<ReorderRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate()?;

    let updated = ExperienceRepository::new(&app_state.database).reorder(&req.ids).await?;
    success(json!({ "updated": updated }))
}
