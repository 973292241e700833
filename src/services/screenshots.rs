//! Keeps each project's stored screenshot in sync with its live URL.
//!
//! One refresh runs: capture -> (settle delay if the capture was suspiciously
//! fast) -> upload -> delete the previous asset (advisory) -> persist the new
//! pair on the project. Persisting is the commit point; if it fails the new
//! upload is left unreferenced and shows up as an orphan in the media stats.

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::assets::{discard, AssetStore, CleanupOutcome};
use super::renderer::ScreenshotRenderer;
use crate::config::ScreenshotConfig;
use crate::database::Database;
use crate::models::{Project, ScreenshotAsset};
use crate::repositories::ProjectRepository;

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedScreenshot {
    pub asset: ScreenshotAsset,
    pub previous_cleanup: CleanupOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScreenshotStatus {
    #[serde(rename_all = "camelCase")]
    Success { screenshot_url: String, cloudinary_id: String },
    Error { error: String },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotResult {
    pub project_id: String,
    pub title: String,
    #[serde(flatten)]
    pub status: ScreenshotStatus,
}

impl ScreenshotResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, ScreenshotStatus::Success { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BulkSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BulkReport {
    pub results: Vec<ScreenshotResult>,
    pub summary: BulkSummary,
}

impl BulkReport {
    fn from_results(results: Vec<ScreenshotResult>) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        let summary = BulkSummary { total: results.len(), successful, failed: results.len() - successful };
        Self { results, summary }
    }
}

/// Capture timing: the settle delay after a suspiciously fast capture and
/// the spacing between starts of a bulk run. Zero durations disable both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturePacing {
    pub min_capture: Duration,
    pub settle_delay: Duration,
    pub stagger: Duration,
}

impl CapturePacing {
    pub fn from_config(config: &ScreenshotConfig) -> Self {
        Self {
            min_capture: Duration::from_millis(config.min_capture_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            stagger: Duration::from_millis(config.stagger_ms),
        }
    }

    /// Captures `url`, then waits the settle delay if the renderer answered
    /// faster than `min_capture`.
    pub async fn capture(&self, renderer: &dyn ScreenshotRenderer, url: &str) -> Result<Vec<u8>> {
        let started = Instant::now();
        let image = renderer
            .capture(url)
            .await
            .with_context(|| format!("Screenshot capture failed for {}", url))?;

        let elapsed = started.elapsed();
        if elapsed < self.min_capture {
            warn!("Capture of {} finished in {:?}, waiting {:?} before continuing", url, elapsed, self.settle_delay);
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(image)
    }

    /// Runs `run` for every item concurrently. The item at position `n`
    /// starts `n * stagger` after the first. Results keep the input order.
    pub async fn staggered<'a, T, R, F, Fut>(&self, items: &'a [T], run: F) -> Vec<R>
    where
        F: Fn(&'a T) -> Fut,
        Fut: Future<Output = R>,
    {
        let run = &run;
        let runs = items.iter().enumerate().map(|(position, item)| {
            let delay = self.stagger * position as u32;
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                run(item).await
            }
        });
        join_all(runs).await
    }
}

#[derive(Clone)]
pub struct ScreenshotService {
    repository: ProjectRepository,
    renderer: Arc<dyn ScreenshotRenderer>,
    assets: Arc<dyn AssetStore>,
    folder: String,
    pacing: CapturePacing,
}

impl ScreenshotService {
    pub fn new(
        database: &Database,
        renderer: Arc<dyn ScreenshotRenderer>,
        assets: Arc<dyn AssetStore>,
        config: &ScreenshotConfig,
        folder: String,
    ) -> Self {
        Self {
            repository: ProjectRepository::new(database),
            renderer,
            assets,
            folder,
            pacing: CapturePacing::from_config(config),
        }
    }

    /// Captures the project's live URL and replaces its stored screenshot.
    /// Returns `Ok(None)` without side effects when the project has no live URL.
    pub async fn refresh(&self, project: &Project) -> Result<Option<RefreshedScreenshot>> {
        let Some(live_url) = project.live_url() else {
            return Ok(None);
        };

        let image = self.pacing.capture(self.renderer.as_ref(), live_url).await?;

        let uploaded = self
            .assets
            .upload(&image, &self.folder)
            .await
            .context("Screenshot upload failed")?;

        let previous_cleanup = discard(self.assets.as_ref(), project.screenshot_public_id()).await;

        let asset = ScreenshotAsset { url: uploaded.url, public_id: uploaded.public_id };
        let stored = self
            .repository
            .set_screenshot(&project.id, &asset)
            .await
            .with_context(|| format!("Failed to save screenshot for project {}", project.id))?;
        if !stored {
            return Err(anyhow!("Project {} no longer exists", project.id));
        }

        info!("Stored screenshot {} for project {}", asset.public_id, project.id);
        Ok(Some(RefreshedScreenshot { asset, previous_cleanup }))
    }

    /// Refreshes one project and folds the outcome into a result entry.
    pub async fn regenerate(&self, project: &Project) -> ScreenshotResult {
        let status = match self.refresh(project).await {
            Ok(Some(refreshed)) => ScreenshotStatus::Success {
                screenshot_url: refreshed.asset.url,
                cloudinary_id: refreshed.asset.public_id,
            },
            Ok(None) => ScreenshotStatus::Error { error: "Project has no live URL".to_string() },
            Err(e) => {
                error!("Screenshot regeneration failed for project {}: {:#}", project.id, e);
                ScreenshotStatus::Error { error: format!("{:#}", e) }
            }
        };

        ScreenshotResult { project_id: project.id.clone(), title: project.title.clone(), status }
    }

    /// Regenerates every project with a live URL concurrently, starting each
    /// one a stagger interval after the previous one.
    pub async fn regenerate_all(&self) -> Result<BulkReport> {
        let projects = self.repository.list_with_live_url().await?;
        info!("Regenerating screenshots for {} projects", projects.len());

        let results = self.pacing.staggered(&projects, |project| self.regenerate(project)).await;
        let report = BulkReport::from_results(results);
        info!(
            "Screenshot regeneration finished: {} succeeded, {} failed",
            report.summary.successful, report.summary.failed
        );
        Ok(report)
    }

    /// Deletes the project's screenshot from the CDN and clears the stored pair.
    pub async fn remove(&self, project: &Project) -> Result<CleanupOutcome> {
        if project.screenshot.is_none() {
            return Ok(CleanupOutcome::Skipped);
        }
        let cleanup = discard(self.assets.as_ref(), project.screenshot_public_id()).await;
        self.repository.clear_screenshot(&project.id).await?;
        Ok(cleanup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeRenderer;
    use serde_json::json;

    fn pacing(min_capture: u64, settle_delay: u64, stagger: u64) -> CapturePacing {
        CapturePacing {
            min_capture: Duration::from_millis(min_capture),
            settle_delay: Duration::from_millis(settle_delay),
            stagger: Duration::from_millis(stagger),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_capture_waits_for_settle_delay() {
        let renderer = FakeRenderer::new();

        let started = Instant::now();
        let image = pacing(3000, 2000, 0).capture(renderer.as_ref(), "https://fast.test").await.unwrap();
        let elapsed = started.elapsed();

        assert!(!image.is_empty());
        assert!(elapsed >= Duration::from_millis(2000), "waited only {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2100), "waited {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_capture_skips_settle_delay() {
        let renderer = FakeRenderer::new();
        renderer.set_delay(Duration::from_millis(4000));

        let started = Instant::now();
        pacing(3000, 2000, 0).capture(renderer.as_ref(), "https://slow.test").await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(4000), "capture took {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(4100), "settle delay was applied: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_capture_does_not_wait() {
        let renderer = FakeRenderer::failing();

        let started = Instant::now();
        let result = pacing(3000, 2000, 0).capture(renderer.as_ref(), "https://down.test").await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_staggered_starts_are_spaced_by_position() {
        let started = Instant::now();
        let items = ["a", "b", "c", "d"];

        let starts = pacing(0, 0, 1000).staggered(&items, |item| async move { (*item, started.elapsed()) }).await;

        let names: Vec<&str> = starts.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        for (position, (name, offset)) in starts.iter().enumerate() {
            let expected = Duration::from_millis(1000 * position as u64);
            assert!(
                *offset >= expected && *offset < expected + Duration::from_millis(100),
                "{} started at {:?}, expected {:?}",
                name,
                offset,
                expected
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_stagger_starts_everything_at_once() {
        let started = Instant::now();
        let starts = pacing(0, 0, 0).staggered(&[1, 2, 3], |_| async move { started.elapsed() }).await;

        assert!(starts.iter().all(|offset| *offset < Duration::from_millis(1)));
    }

    #[test]
    fn test_result_serialization_is_tagged() {
        let ok = ScreenshotResult {
            project_id: "p1".to_string(),
            title: "One".to_string(),
            status: ScreenshotStatus::Success {
                screenshot_url: "https://cdn.test/1.webp".to_string(),
                cloudinary_id: "portfolio/screenshots/1".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({
                "projectId": "p1",
                "title": "One",
                "status": "success",
                "screenshotUrl": "https://cdn.test/1.webp",
                "cloudinaryId": "portfolio/screenshots/1"
            })
        );
    }

    #[test]
    fn test_summary_counts_match_results() {
        let entry = |id: &str, ok: bool| ScreenshotResult {
            project_id: id.to_string(),
            title: id.to_string(),
            status: if ok {
                ScreenshotStatus::Success { screenshot_url: "u".to_string(), cloudinary_id: "c".to_string() }
            } else {
                ScreenshotStatus::Error { error: "boom".to_string() }
            },
        };
        let report = BulkReport::from_results(vec![entry("a", true), entry("b", false), entry("c", true)]);
        assert_eq!(report.summary, BulkSummary { total: 3, successful: 2, failed: 1 });
    }
}
