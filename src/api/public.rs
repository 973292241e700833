use anyhow::Result;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use super::error::ApiError;
use super::response::success;
use crate::auth::extractors::AppState;
use crate::repositories::{ExperienceRepository, ProjectRepository, SkillRepository};

// Unauthenticated reads for the public site. Only published entries are visible.
pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/projects", get(published_projects))
        .route("/projects/{id}", get(published_project))
        .route("/experiences", get(published_experiences))
        .route("/skills", get(published_skills));

    Ok(router)
}

async fn published_projects(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let projects = ProjectRepository::new(&app_state.database).list_published().await?;
    success(json!({ "projects": projects }))
}

async fn published_project(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let project = ProjectRepository::new(&app_state.database)
        .get(&id)
        .await?
        .filter(|project| project.is_published)
        .ok_or(ApiError::NotFound("Project"))?;
    success(json!({ "project": project }))
}

async fn published_experiences(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let experiences = ExperienceRepository::new(&app_state.database).list_published().await?;
    success(json!({ "experiences": experiences }))
}

async fn published_skills(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let skills = SkillRepository::new(&app_state.database).list_published().await?;
    success(json!({ "skills": skills }))
}
