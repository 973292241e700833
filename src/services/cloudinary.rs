use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Response};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

use super::assets::{AssetStore, RemoteAsset, UploadedAsset};
use crate::config::CloudinaryConfig;

/// Delivery format uploads are converted to.
pub const DELIVERY_FORMAT: &str = "webp";
/// Incoming transformation applied on upload.
pub const UPLOAD_TRANSFORMATION: &str = "q_auto:good";
const LIST_PAGE_SIZE: u32 = 500;
// Each bulk delete call removes at most 1000 assets and flags `partial` when more remain.
const MAX_DELETE_ROUNDS: usize = 20;

#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    client: Client,
    api_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    resources: Vec<ListedResource>,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedResource {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    bytes: u64,
    #[serde(default)]
    format: String,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResourcesResponse {
    #[serde(default)]
    deleted: BTreeMap<String, String>,
    #[serde(default)]
    partial: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("portfolio-rs/0.1")
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build Cloudinary HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1_1/{}/{}", self.api_url, self.cloud_name, path)
    }

    /// Signs upload API parameters: `k=v` pairs sorted by key, joined with
    /// `&`, followed by the API secret, hashed with SHA-256.
    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        let to_sign = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");
        let digest = Sha256::digest(format!("{}{}", to_sign, self.api_secret).as_bytes());
        format!("{:x}", digest)
    }

    fn signed_form(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = self.sign(&params);
        params.insert("signature", signature);
        params.insert("api_key", self.api_key.clone());
        params
    }

    async fn error_from(response: Response, action: &str) -> anyhow::Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        tracing::error!("Cloudinary {} failed - Status: {}, Message: {}", action, status, message);
        anyhow!("Cloudinary {} failed: {} - {}", action, status, message)
    }
}

#[async_trait]
impl AssetStore for CloudinaryClient {
    async fn upload(&self, image: &[u8], folder: &str) -> Result<UploadedAsset> {
        let mut params = BTreeMap::new();
        params.insert("folder", folder.to_string());
        params.insert("format", DELIVERY_FORMAT.to_string());
        params.insert("transformation", UPLOAD_TRANSFORMATION.to_string());
        let mut form = self.signed_form(params);
        form.insert("file", data_uri(image));

        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .form(&form)
            .send()
            .await
            .context("Cloudinary upload request failed")?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "upload").await);
        }

        let uploaded: UploadResponse = response.json().await.context("Failed to parse Cloudinary upload response")?;
        tracing::info!("Uploaded {} to Cloudinary", uploaded.public_id);
        Ok(UploadedAsset { url: uploaded.secure_url, public_id: uploaded.public_id })
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("invalidate", "true".to_string());
        let form = self.signed_form(params);

        let response = self
            .client
            .post(self.endpoint("image/destroy"))
            .form(&form)
            .send()
            .await
            .context("Cloudinary destroy request failed")?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "destroy").await);
        }

        let destroyed: DestroyResponse = response.json().await.context("Failed to parse Cloudinary destroy response")?;
        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                tracing::debug!("Cloudinary asset {} was already gone", public_id);
                Ok(())
            }
            other => Err(anyhow!("Cloudinary destroy of {} returned '{}'", public_id, other)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteAsset>> {
        let mut assets = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![
                ("type", "upload".to_string()),
                ("prefix", prefix.to_string()),
                ("max_results", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(next) = &cursor {
                query.push(("next_cursor", next.clone()));
            }

            let response = self
                .client
                .get(self.endpoint("resources/image/upload"))
                .basic_auth(&self.api_key, Some(&self.api_secret))
                .query(&query)
                .send()
                .await
                .context("Cloudinary list request failed")?;

            if !response.status().is_success() {
                return Err(Self::error_from(response, "list").await);
            }

            let page: ListResponse = response.json().await.context("Failed to parse Cloudinary list response")?;
            assets.extend(page.resources.into_iter().map(|r| RemoteAsset {
                public_id: r.public_id,
                url: r.secure_url,
                bytes: r.bytes,
                format: r.format,
                created_at: r.created_at,
            }));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(assets)
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let mut deleted = 0;

        for _ in 0..MAX_DELETE_ROUNDS {
            let response = self
                .client
                .delete(self.endpoint("resources/image/upload"))
                .basic_auth(&self.api_key, Some(&self.api_secret))
                .query(&[("prefix", prefix)])
                .send()
                .await
                .context("Cloudinary bulk delete request failed")?;

            if !response.status().is_success() {
                return Err(Self::error_from(response, "bulk delete").await);
            }

            let round: DeleteResourcesResponse =
                response.json().await.context("Failed to parse Cloudinary bulk delete response")?;
            deleted += round.deleted.values().filter(|status| status.as_str() == "deleted").count();

            if !round.partial {
                return Ok(deleted);
            }
        }

        tracing::warn!("Cloudinary bulk delete of {} still partial after {} rounds", prefix, MAX_DELETE_ROUNDS);
        Ok(deleted)
    }
}

/// Encodes image bytes as a base64 data URI, sniffing the media type.
pub fn data_uri(image: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_media_type(image), STANDARD.encode(image))
}

fn sniff_media_type(image: &[u8]) -> &'static str {
    if image.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if image.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if image.len() >= 12 && &image[0..4] == b"RIFF" && &image[8..12] == b"WEBP" {
        "image/webp"
    } else if image.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}
