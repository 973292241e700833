use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Image stored on the CDN, as returned by an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
}

/// Entry of a CDN listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAsset {
    pub public_id: String,
    pub url: String,
    pub bytes: u64,
    pub format: String,
    pub created_at: String,
}

/// Remote image host.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Uploads an image into `folder`, converted to a compressed web format.
    async fn upload(&self, image: &[u8], folder: &str) -> Result<UploadedAsset>;
    /// Deletes one asset. Deleting an asset that is already gone succeeds.
    async fn destroy(&self, public_id: &str) -> Result<()>;
    /// Lists every asset whose id starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteAsset>>;
    /// Deletes every asset whose id starts with `prefix`; returns how many went.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize>;
}

/// Outcome of a best-effort side cleanup. Never fails the primary operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum CleanupOutcome {
    Skipped,
    Deleted,
    Failed(String),
}

impl CleanupOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CleanupOutcome::Failed(_))
    }
}

/// Deletes `public_id` from the CDN if there is one, logging instead of propagating failures.
pub async fn discard(store: &dyn AssetStore, public_id: Option<&str>) -> CleanupOutcome {
    let Some(public_id) = public_id else {
        return CleanupOutcome::Skipped;
    };

    match store.destroy(public_id).await {
        Ok(()) => {
            debug!("Deleted CDN asset {}", public_id);
            CleanupOutcome::Deleted
        }
        Err(e) => {
            warn!("Failed to delete CDN asset {}: {:#}", public_id, e);
            CleanupOutcome::Failed(e.to_string())
        }
    }
}
