use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::extractors::AppState;
use crate::config::{
    AppConfig, AuthConfig, CloudinaryConfig, DatabaseConfig, ScreenshotConfig, ServerConfig,
};
use crate::database::{Database, MIGRATOR};
use crate::services::{AssetStore, RemoteAsset, ScreenshotRenderer, UploadedAsset};

static TEST_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Create an isolated in-memory SQLite database for testing
pub async fn create_test_database() -> Result<Database> {
    let counter = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_name = format!("file:portfolio_test_{}?mode=memory&cache=shared", counter);

    let pool = SqlitePoolOptions::new()
        .max_connections(1) // SQLite in-memory works best with single connection
        .connect(&db_name)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(Database::from_pool(pool))
}

/// Configuration with every delay disabled and insecure cookies, so tests
/// run fast over plain HTTP.
pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            admin_ui_dir: "./admin-ui".to_string(),
        },
        database: DatabaseConfig { url: "sqlite::memory:".to_string(), max_connections: 1 },
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expires_in: "1h".to_string(),
            cookie_name: "admin_token".to_string(),
            cookie_secure: false,
            bootstrap_admin: None,
        },
        screenshot: ScreenshotConfig {
            api_url: "http://localhost/take".to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
            min_capture_ms: 0,
            settle_delay_ms: 0,
            stagger_ms: 0,
        },
        cloudinary: CloudinaryConfig {
            api_url: "http://localhost".to_string(),
            cloud_name: "test-cloud".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "portfolio".to_string(),
        },
    }
}

pub async fn test_app_state(
    renderer: Arc<FakeRenderer>,
    assets: Arc<FakeAssetStore>,
) -> Result<AppState> {
    let database = create_test_database().await?;
    AppState::new(test_config(), database, renderer, assets)
}

/// Renderer returning a fixed PNG-looking payload, or failing on demand.
#[derive(Default)]
pub struct FakeRenderer {
    fail: AtomicBool,
    delay_ms: AtomicU64,
    captured: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let renderer = Self::default();
        renderer.fail.store(true, Ordering::SeqCst);
        Arc::new(renderer)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Makes every capture take `delay` on the tokio clock.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn captured(&self) -> Vec<String> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScreenshotRenderer for FakeRenderer {
    async fn capture(&self, target_url: &str) -> Result<Vec<u8>> {
        self.captured.lock().unwrap().push(target_url.to_string());
        let delay_ms = self.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("render failed for {}", target_url));
        }
        Ok(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetCall {
    Upload { folder: String },
    Destroy(String),
    List(String),
    DeleteByPrefix(String),
}

/// In-memory CDN that records every call in order.
#[derive(Default)]
pub struct FakeAssetStore {
    assets: Mutex<BTreeMap<String, RemoteAsset>>,
    calls: Mutex<Vec<AssetCall>>,
    next_id: AtomicUsize,
    fail_upload: AtomicBool,
    fail_destroy: AtomicBool,
}

impl FakeAssetStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_destroy(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }

    /// Places an asset on the CDN without recording a call.
    pub fn seed(&self, public_id: &str, bytes: u64) {
        self.assets.lock().unwrap().insert(public_id.to_string(), remote(public_id, bytes));
    }

    pub fn calls(&self) -> Vec<AssetCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AssetCall::Destroy(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, public_id: &str) -> bool {
        self.assets.lock().unwrap().contains_key(public_id)
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.assets.lock().unwrap().keys().cloned().collect()
    }

    fn record(&self, call: AssetCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn remote(public_id: &str, bytes: u64) -> RemoteAsset {
    RemoteAsset {
        public_id: public_id.to_string(),
        url: format!("https://cdn.test/{}.webp", public_id),
        bytes,
        format: "webp".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn upload(&self, image: &[u8], folder: &str) -> Result<UploadedAsset> {
        self.record(AssetCall::Upload { folder: folder.to_string() });
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(anyhow!("upload rejected"));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("{}/asset-{}", folder, n);
        let asset = remote(&public_id, image.len() as u64);
        let uploaded = UploadedAsset { url: asset.url.clone(), public_id: public_id.clone() };
        self.assets.lock().unwrap().insert(public_id, asset);
        Ok(uploaded)
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        self.record(AssetCall::Destroy(public_id.to_string()));
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(anyhow!("destroy rejected"));
        }
        self.assets.lock().unwrap().remove(public_id);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<RemoteAsset>> {
        self.record(AssetCall::List(prefix.to_string()));
        Ok(self
            .assets
            .lock()
            .unwrap()
            .values()
            .filter(|asset| asset.public_id.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        self.record(AssetCall::DeleteByPrefix(prefix.to_string()));
        let mut assets = self.assets.lock().unwrap();
        let before = assets.len();
        assets.retain(|id, _| !id.starts_with(prefix));
        Ok(before - assets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CollectionName;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_isolated_databases() {
        let db1 = create_test_database().await.unwrap();
        let db2 = create_test_database().await.unwrap();

        let doc = json!({"title": "One"}).as_object().unwrap().clone();
        db1.collection(CollectionName::Skills).insert(doc).await.unwrap();

        assert_eq!(db1.collection(CollectionName::Skills).count().await.unwrap(), 1);
        assert_eq!(db2.collection(CollectionName::Skills).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fake_asset_store_prefix_operations() {
        let store = FakeAssetStore::new();
        store.seed("portfolio/screenshots/a", 10);
        store.seed("portfolio/certificates/b", 20);

        assert_eq!(store.list("portfolio/screenshots/").await.unwrap().len(), 1);
        assert_eq!(store.delete_by_prefix("portfolio/screenshots/").await.unwrap(), 1);
        assert_eq!(store.stored_ids(), vec!["portfolio/certificates/b".to_string()]);
    }
}
