use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::config::ScreenshotConfig;

pub const VIEWPORT_WIDTH: u32 = 1440;
pub const VIEWPORT_HEIGHT: u32 = 900;
pub const IMAGE_FORMAT: &str = "png";
pub const IMAGE_QUALITY: u8 = 90;
/// Seconds the renderer waits after load before capturing.
pub const RENDER_DELAY_SECS: u32 = 3;
/// Seconds the renderer may spend loading the page.
pub const RENDER_TIMEOUT_SECS: u32 = 60;
pub const CACHE_BUST_PARAM: &str = "_cb";

/// Renders a live web page into an image.
#[async_trait]
pub trait ScreenshotRenderer: Send + Sync {
    async fn capture(&self, target_url: &str) -> Result<Vec<u8>>;
}

/// Client for a ScreenshotOne-compatible capture API.
#[derive(Debug, Clone)]
pub struct HttpScreenshotRenderer {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpScreenshotRenderer {
    pub fn new(config: &ScreenshotConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("portfolio-rs/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build screenshot HTTP client")?;

        Ok(Self { client, api_url: config.api_url.clone(), api_key: config.api_key.clone() })
    }

    fn render_params(&self, target_url: &str) -> Vec<(&'static str, String)> {
        vec![
            ("access_key", self.api_key.clone()),
            ("url", target_url.to_string()),
            ("viewport_width", VIEWPORT_WIDTH.to_string()),
            ("viewport_height", VIEWPORT_HEIGHT.to_string()),
            ("device_scale_factor", "1".to_string()),
            ("format", IMAGE_FORMAT.to_string()),
            ("image_quality", IMAGE_QUALITY.to_string()),
            ("block_ads", "true".to_string()),
            ("block_cookie_banners", "true".to_string()),
            ("wait_until", "networkidle0".to_string()),
            ("delay", RENDER_DELAY_SECS.to_string()),
            ("timeout", RENDER_TIMEOUT_SECS.to_string()),
            ("cache", "false".to_string()),
        ]
    }
}

#[async_trait]
impl ScreenshotRenderer for HttpScreenshotRenderer {
    async fn capture(&self, target_url: &str) -> Result<Vec<u8>> {
        let target = cache_busted(target_url, chrono::Utc::now().timestamp_millis())?;
        tracing::debug!("Requesting screenshot of {}", target);

        let response = self
            .client
            .get(&self.api_url)
            .query(&self.render_params(&target))
            .send()
            .await
            .context("Screenshot request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Screenshot API error - URL: {}, Status: {}, Body: {}", target_url, status, body);
            return Err(anyhow!("Screenshot API error: {}", status));
        }

        let image = response.bytes().await.context("Failed to read screenshot body")?;
        if image.is_empty() {
            return Err(anyhow!("Screenshot API returned an empty image"));
        }

        Ok(image.to_vec())
    }
}

/// Appends a unique query parameter so repeated captures bypass caches.
pub fn cache_busted(target_url: &str, stamp: i64) -> Result<String> {
    let mut url = Url::parse(target_url).with_context(|| format!("Invalid live URL: {}", target_url))?;
    url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &stamp.to_string());
    Ok(url.to_string())
}
