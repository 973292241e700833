use anyhow::Result;
use portfolio_rs::api::create_app;
use portfolio_rs::auth::extractors::AppState;
use portfolio_rs::services::{AssetStore, CloudinaryClient, HttpScreenshotRenderer, ScreenshotRenderer, SeedingService};
use portfolio_rs::{AppConfig, Database};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_rs=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::new()?;
    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    info!("Starting portfolio server on {}", bind_address);

    // Initialize database
    let database = match Database::new(&config.database.url, config.database.max_connections).await {
        Ok(db) => {
            info!("Database connected successfully");
            db
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e);
        }
    };

    // Initialize external clients
    let renderer: Arc<dyn ScreenshotRenderer> = match HttpScreenshotRenderer::new(&config.screenshot) {
        Ok(renderer) => {
            info!("Screenshot renderer configured for {}", config.screenshot.api_url);
            Arc::new(renderer)
        }
        Err(e) => {
            error!("Failed to initialize screenshot renderer: {}", e);
            return Err(e);
        }
    };
    if config.screenshot.api_key.is_empty() {
        warn!("SCREENSHOT_API_KEY is not set, screenshot generation will fail");
    }

    let assets: Arc<dyn AssetStore> = match CloudinaryClient::new(&config.cloudinary) {
        Ok(client) => {
            info!("Cloudinary client configured for cloud '{}'", config.cloudinary.cloud_name);
            Arc::new(client)
        }
        Err(e) => {
            error!("Failed to initialize Cloudinary client: {}", e);
            return Err(e);
        }
    };

    // Bootstrap the first admin account when configured
    if let Some(bootstrap) = &config.auth.bootstrap_admin {
        let seeding = SeedingService::new(database.clone());
        if let Err(e) = seeding.ensure_admin(bootstrap).await {
            error!("Failed to create bootstrap admin: {}", e);
            return Err(e);
        }
    }

    // Create application state
    let app_state = AppState::new(config, database.clone(), renderer, assets)?;

    // Build application router
    let app = create_app(app_state).await?;

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Server listening on http://{}", bind_address);

    // Start server
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server stopped, closing database");
    database.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
