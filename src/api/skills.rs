use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use validator::Validate;

use super::error::ApiError;
use super::extract::ApiJson;
use super::experiences::ReorderRequest;
use super::response::success;
use crate::auth::{extractors::AppState, AuthenticatedAdmin};
use crate::models::SkillInput;
use crate::repositories::SkillRepository;

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_skills).post(create_skill))
        .route("/reorder", put(reorder_skills))
        .route("/{id}", get(get_skill).put(update_skill).delete(delete_skill));

    Ok(router)
}

async fn list_skills(State(app_state): State<AppState>, _admin: AuthenticatedAdmin) -> Result<Json<Value>, ApiError> {
    let skills = SkillRepository::new(&app_state.database).list().await?;
    success(json!({ "skills": skills }))
}

async fn get_skill(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let skill = SkillRepository::new(&app_state.database)
        .get(&id)
        .await?
        .ok_or(ApiError::NotFound("Skill"))?;
    success(json!({ "skill": skill }))
}

async fn create_skill(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    ApiJson(input): ApiJson<SkillInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    input.validate()?;

    let skill = SkillRepository::new(&app_state.database).create(input).await?;
    Ok((StatusCode::CREATED, success(json!({ "skill": skill }))?))
}

async fn update_skill(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SkillInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate()?;

    let skill = SkillRepository::new(&app_state.database)
        .update(&id, input)
        .await?
        .ok_or(ApiError::NotFound("Skill"))?;
    success(json!({ "skill": skill }))
}

async fn delete_skill(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !SkillRepository::new(&app_state.database).delete(&id).await? {
        return Err(ApiError::NotFound("Skill"));
    }
    success(json!({}))
}

async fn reorder_skills(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    ApiJson(req): ApiJson<ReorderRequest>,
) -> Result<Json<Value>, ApiError> {
    req.validate()?;

    let updated = SkillRepository::new(&app_state.database).reorder(&req.ids).await?;
    success(json!({ "updated": updated }))
}
