use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub screenshot: ScreenshotConfig,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub admin_ui_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in: String,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Admin account created at startup when it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    pub api_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    /// Captures finishing faster than this are treated as possibly premature.
    pub min_capture_ms: u64,
    /// Extra wait applied after a premature capture.
    pub settle_delay_ms: u64,
    /// Delay between the starts of consecutive captures in a bulk run.
    pub stagger_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub api_url: String,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

impl CloudinaryConfig {
    pub fn screenshot_folder(&self) -> String {
        format!("{}/screenshots", self.folder)
    }
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let bootstrap_admin = match (env_opt("ADMIN_EMAIL"), env_opt("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: env_or("ADMIN_NAME", "Admin"),
            }),
            _ => None,
        };

        let config = Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_parse("PORT", 3000),
                admin_ui_dir: env_or("ADMIN_UI_DIR", "./admin-ui"),
            },
            database: DatabaseConfig {
                url: env_or("DATABASE_URL", "sqlite://portfolio.db"),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 5),
            },
            auth: AuthConfig {
                jwt_secret: env_or("JWT_SECRET", "change-me-in-production"),
                jwt_expires_in: env_or("JWT_EXPIRES_IN", "7d"),
                cookie_name: env_or("AUTH_COOKIE_NAME", "admin_token"),
                cookie_secure: env_parse("AUTH_COOKIE_SECURE", true),
                bootstrap_admin,
            },
            screenshot: ScreenshotConfig {
                api_url: env_or("SCREENSHOT_API_URL", "https://api.screenshotone.com/take"),
                api_key: env_or("SCREENSHOT_API_KEY", ""),
                timeout_secs: env_parse("SCREENSHOT_TIMEOUT_SECS", 90),
                min_capture_ms: env_parse("SCREENSHOT_MIN_CAPTURE_MS", 3000),
                settle_delay_ms: env_parse("SCREENSHOT_SETTLE_DELAY_MS", 2000),
                stagger_ms: env_parse("SCREENSHOT_STAGGER_MS", 1000),
            },
            cloudinary: CloudinaryConfig {
                api_url: env_or("CLOUDINARY_API_URL", "https://api.cloudinary.com"),
                cloud_name: env_or("CLOUDINARY_CLOUD_NAME", ""),
                api_key: env_or("CLOUDINARY_API_KEY", ""),
                api_secret: env_or("CLOUDINARY_API_SECRET", ""),
                folder: env_or("CLOUDINARY_FOLDER", "portfolio"),
            },
        };

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new().expect("Failed to create default config")
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
