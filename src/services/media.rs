use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use super::assets::{AssetStore, RemoteAsset, UploadedAsset};
use crate::config::CloudinaryConfig;
use crate::database::Database;
use crate::repositories::ProjectRepository;

lazy_static::lazy_static! {
    static ref FOLDER_NAME: regex::Regex = regex::Regex::new(r"^[a-z0-9][a-z0-9_-]{0,63}$").unwrap();
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStats {
    pub total_assets: usize,
    pub total_bytes: u64,
    pub screenshot_count: usize,
    pub other_count: usize,
    pub screenshots: Vec<RemoteAsset>,
    pub other: Vec<RemoteAsset>,
    /// Screenshot assets no project references.
    pub orphaned: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCleanup {
    pub assets_deleted: usize,
    pub projects_cleared: usize,
}

/// Listing, orphan detection, bulk reset and ad-hoc uploads under the portfolio folder.
pub struct MediaService {
    repository: ProjectRepository,
    assets: Arc<dyn AssetStore>,
    root_folder: String,
    screenshot_folder: String,
}

impl MediaService {
    pub fn new(database: &Database, assets: Arc<dyn AssetStore>, config: &CloudinaryConfig) -> Self {
        Self {
            repository: ProjectRepository::new(database),
            assets,
            root_folder: config.folder.clone(),
            screenshot_folder: config.screenshot_folder(),
        }
    }

    pub async fn stats(&self) -> Result<MediaStats> {
        let listed = self.assets.list(&format!("{}/", self.root_folder)).await?;
        let screenshot_prefix = format!("{}/", self.screenshot_folder);

        let (screenshots, other): (Vec<RemoteAsset>, Vec<RemoteAsset>) =
            listed.into_iter().partition(|asset| asset.public_id.starts_with(&screenshot_prefix));

        let referenced: HashSet<String> = self
            .repository
            .list()
            .await?
            .into_iter()
            .filter_map(|project| project.screenshot.map(|asset| asset.public_id))
            .collect();
        let orphaned = screenshots
            .iter()
            .filter(|asset| !referenced.contains(&asset.public_id))
            .map(|asset| asset.public_id.clone())
            .collect();

        Ok(MediaStats {
            total_assets: screenshots.len() + other.len(),
            total_bytes: screenshots.iter().chain(other.iter()).map(|asset| asset.bytes).sum(),
            screenshot_count: screenshots.len(),
            other_count: other.len(),
            screenshots,
            other,
            orphaned,
        })
    }

    /// Deletes every screenshot asset, then clears the screenshot pair on
    /// every project. Fields are only cleared once the CDN delete succeeded.
    pub async fn reset_screenshots(&self) -> Result<MediaCleanup> {
        let assets_deleted = self.assets.delete_by_prefix(&format!("{}/", self.screenshot_folder)).await?;
        let projects_cleared = self.repository.clear_all_screenshots().await?;

        info!("Screenshot reset: {} assets deleted, {} projects cleared", assets_deleted, projects_cleared);
        Ok(MediaCleanup { assets_deleted, projects_cleared })
    }

    /// Uploads an arbitrary image (e.g. a certificate) under `<root>/<folder>`.
    pub async fn upload(&self, image: &[u8], folder: &str) -> Result<UploadedAsset> {
        if image.is_empty() {
            return Err(anyhow!("Image body is empty"));
        }
        if !FOLDER_NAME.is_match(folder) {
            return Err(anyhow!("Invalid folder name: {}", folder));
        }
        self.assets.upload(image, &format!("{}/{}", self.root_folder, folder)).await
    }
}

/// True for folder names accepted by [`MediaService::upload`].
pub fn is_valid_folder(folder: &str) -> bool {
    FOLDER_NAME.is_match(folder)
}
