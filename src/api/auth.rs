use anyhow::Result;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;

use super::extract::ApiJson;
use crate::auth::cookie::{expired_cookie, session_cookie};
use crate::auth::password::verify_password;
use crate::auth::{extractors::AppState, AuthError, VerifiedAdmin};
use crate::database::StoreError;
use crate::models::AdminInfo;
use crate::repositories::AdminRepository;
use crate::services::SeedingService;

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct SetupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupCheckResponse {
    pub success: bool,
    pub needs_setup: bool,
}

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/setup/check", get(check_setup))
        .route("/setup", post(initial_setup));

    Ok(router)
}

async fn login(State(app_state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<Response, AuthError> {
    req.validate().map_err(|_| AuthError::BadRequest("Email and password are required".to_string()))?;

    let admin_repo = AdminRepository::new(&app_state.database);
    let admin = admin_repo
        .find_by_email(&req.email)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or_else(|| {
            warn!("Login attempt for unknown email {}", req.email);
            AuthError::InvalidCredentials
        })?;

    let is_valid = verify_password(&req.password, &admin.password_hash).map_err(|_| AuthError::InvalidCredentials)?;
    if !is_valid {
        warn!("Wrong password for {}", admin.email);
        return Err(AuthError::InvalidCredentials);
    }

    let token = app_state
        .jwt_service
        .create_token_for_admin(admin.id.clone(), admin.email.clone(), admin.role.clone())
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    let auth = &app_state.config.auth;
    let cookie = session_cookie(
        &auth.cookie_name,
        &token,
        app_state.jwt_service.expires_in().num_seconds(),
        auth.cookie_secure,
    );

    info!("Admin {} logged in", admin.email);
    let body = Json(json!({ "success": true, "admin": AdminInfo::from(admin) }));
    Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

async fn logout(State(app_state): State<AppState>) -> Response {
    let auth = &app_state.config.auth;
    let cookie = expired_cookie(&auth.cookie_name, auth.cookie_secure);
    ([(header::SET_COOKIE, cookie)], Json(json!({ "success": true }))).into_response()
}

async fn me(verified: VerifiedAdmin) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "admin": AdminInfo::from(verified.admin) }))
}

async fn check_setup(State(app_state): State<AppState>) -> Result<Json<SetupCheckResponse>, AuthError> {
    let admin_repo = AdminRepository::new(&app_state.database);
    let admin_count = admin_repo.count_admins().await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(Json(SetupCheckResponse { success: true, needs_setup: admin_count == 0 }))
}

async fn initial_setup(
    State(app_state): State<AppState>,
    ApiJson(req): ApiJson<SetupRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    req.validate().map_err(|e| AuthError::BadRequest(format!("Invalid setup request: {}", e)))?;

    let admin_repo = AdminRepository::new(&app_state.database);
    let admin_count = admin_repo.count_admins().await.map_err(|e| AuthError::DatabaseError(e.to_string()))?;
    if admin_count > 0 {
        return Err(AuthError::Forbidden("Setup has already been completed".to_string()));
    }

    let seeding = SeedingService::new(app_state.database.clone());
    let admin = seeding.create_admin(&req.email, &req.password, &req.name).await.map_err(setup_error)?;

    info!("Initial setup created admin {}", admin.email);
    Ok(Json(json!({ "success": true, "admin": AdminInfo::from(admin) })))
}

// A concurrent setup can win the race between the count check and the insert.
fn setup_error(error: anyhow::Error) -> AuthError {
    match error.downcast_ref::<StoreError>() {
        Some(StoreError::Duplicate) => AuthError::EmailExists,
        _ => AuthError::DatabaseError(format!("{:#}", error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use axum::http::StatusCode;

    #[test]
    fn test_setup_duplicate_maps_to_conflict() {
        let duplicate = Err::<(), _>(StoreError::Duplicate)
            .context("An admin with email a@x.test already exists")
            .unwrap_err();
        assert_eq!(setup_error(duplicate).into_response().status(), StatusCode::CONFLICT);

        let other = anyhow::anyhow!("disk full");
        assert_eq!(setup_error(other).into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
