use crate::auth::{claims::TokenClaims, cookie::read_cookie, errors::AuthError, jwt::JwtService};
use crate::config::AppConfig;
use crate::database::Database;
use crate::models::Admin;
use crate::repositories::AdminRepository;
use crate::services::{
    assets::AssetStore, media::MediaService, projects::ProjectService, renderer::ScreenshotRenderer,
    screenshots::ScreenshotService,
};
use anyhow::Result;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;
use tracing::{debug, error, warn};

// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub jwt_service: JwtService,
    pub config: AppConfig,
    pub renderer: Arc<dyn ScreenshotRenderer>,
    pub assets: Arc<dyn AssetStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        database: Database,
        renderer: Arc<dyn ScreenshotRenderer>,
        assets: Arc<dyn AssetStore>,
    ) -> Result<Self> {
        let jwt_service = JwtService::new(&config.auth)?;
        Ok(Self { database, jwt_service, config, renderer, assets })
    }

    pub fn screenshots(&self) -> ScreenshotService {
        ScreenshotService::new(
            &self.database,
            self.renderer.clone(),
            self.assets.clone(),
            &self.config.screenshot,
            self.config.cloudinary.screenshot_folder(),
        )
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(&self.database, self.screenshots(), self.assets.clone())
    }

    pub fn media(&self) -> MediaService {
        MediaService::new(&self.database, self.assets.clone(), &self.config.cloudinary)
    }
}

/// Admin identified by a valid signed token. The store is not consulted.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub claims: TokenClaims,
}

impl FromRequestParts<AppState> for AuthenticatedAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_cookie(parts, state)?;
        let claims = decode_claims(state, &token)?;
        Ok(AuthenticatedAdmin { claims })
    }
}

/// Stricter guard: the token must be valid and its subject must still exist.
#[derive(Debug, Clone)]
pub struct VerifiedAdmin {
    pub admin: Admin,
}

impl FromRequestParts<AppState> for VerifiedAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        debug!("Attempting to extract VerifiedAdmin from request");

        let token = extract_token_from_cookie(parts, state)?;
        let claims = decode_claims(state, &token)?;

        let admin_repo = AdminRepository::new(&state.database);
        let admin = admin_repo
            .get_admin(&claims.sub)
            .await
            .map_err(|e| {
                error!("Database error while fetching admin {}: {:?}", claims.sub, e);
                AuthError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                warn!("Admin not found for ID: {}", claims.sub);
                AuthError::AdminNotFound
            })?;

        debug!("VerifiedAdmin extracted successfully for: {}", admin.email);
        Ok(VerifiedAdmin { admin })
    }
}

fn extract_token_from_cookie(parts: &Parts, state: &AppState) -> Result<String, AuthError> {
    read_cookie(&parts.headers, &state.config.auth.cookie_name).ok_or(AuthError::MissingToken)
}

fn decode_claims(state: &AppState, token: &str) -> Result<TokenClaims, AuthError> {
    let invalid = |reason: String| AuthError::InvalidToken {
        reason,
        cookie_name: state.config.auth.cookie_name.clone(),
        secure: state.config.auth.cookie_secure,
    };

    state.jwt_service.decode_token(token).map_err(|e| {
        debug!("Rejected token: {:?}", e);
        invalid(e.to_string())
    })
}
