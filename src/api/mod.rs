pub mod auth;
pub mod error;
pub mod experiences;
pub mod extract;
pub mod media;
pub mod projects;
pub mod public;
pub mod response;
pub mod screenshots;
pub mod skills;

use anyhow::Result;
use axum::{extract::State, http::StatusCode, middleware, routing::get, Router};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::auth::{extractors::AppState, gate::admin_gate};

pub async fn create_router() -> Result<Router<AppState>> {
    let router = Router::new()
        .route("/status", get(status_handler))
        .nest("/auth", auth::create_router().await?)
        .nest(
            "/projects",
            projects::create_router().await?.merge(screenshots::create_router().await?),
        )
        .nest("/experiences", experiences::create_router().await?)
        .nest("/skills", skills::create_router().await?)
        .nest("/media", media::create_router().await?)
        .nest("/public", public::create_router().await?);

    Ok(router)
}

/// Full application: JSON API, health probe and the gated admin UI bundle.
pub async fn create_app(app_state: AppState) -> Result<Router> {
    let ui_dir = Path::new(&app_state.config.server.admin_ui_dir);
    let admin_ui = ServeDir::new(ui_dir).fallback(ServeFile::new(ui_dir.join("index.html")));

    let admin: Router<AppState> = Router::new()
        .nest_service("/admin", admin_ui)
        .layer(middleware::from_fn_with_state(app_state.clone(), admin_gate));

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api", create_router().await?)
        .merge(admin)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(app)
}

async fn root_handler() -> &'static str {
    "Portfolio API"
}

async fn status_handler() -> &'static str {
    "API is running"
}

async fn health_handler(State(app_state): State<AppState>) -> (StatusCode, &'static str) {
    match app_state.database.health_check().await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Database connection failed")
        }
    }
}
