use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use serde_json::{json, Value};
use tracing::info;
use validator::Validate;

use super::error::ApiError;
use super::extract::ApiJson;
use super::response::success;
use crate::auth::{extractors::AppState, AuthenticatedAdmin};
use crate::models::ProjectInput;
use crate::repositories::ProjectRepository;

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/{id}", get(get_project).put(update_project).delete(delete_project))
        .route("/{id}/toggle-publish", patch(toggle_publish));

    Ok(router)
}

async fn list_projects(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
) -> Result<Json<Value>, ApiError> {
    let projects = ProjectRepository::new(&app_state.database).list().await?;
    success(json!({ "projects": projects }))
}

async fn get_project(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project = ProjectRepository::new(&app_state.database)
        .get(&id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    success(json!({ "project": project }))
}

async fn create_project(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    input.validate()?;

    let saved = app_state.projects().create(input).await?;
    Ok((StatusCode::CREATED, success(saved)?))
}

async fn update_project(
    State(app_state): State<AppState>,
    _admin: AuthenticatedAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<Json<Value>, ApiError> {
    input.validate()?;

    let saved = app_state
        .projects()
        .update(&id, input)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    success(saved)
}

async fn delete_project(
    State(app_state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = app_state
        .projects()
        .delete(&id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    info!("Project {} deleted by {}", id, admin.claims.email);
    success(deleted)
}

async fn toggle_publish(
    State(app_state): State<AppState>,
    admin: AuthenticatedAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let is_published = ProjectRepository::new(&app_state.database)
        .toggle_publish(&id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    let visibility = if is_published { "published" } else { "hidden" };
    info!("Project {} is now {} ({})", id, visibility, admin.claims.email);
    success(json!({ "isPublished": is_published }))
}
