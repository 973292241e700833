use anyhow::Result;
use portfolio_rs::auth::extractors::AppState;
use portfolio_rs::models::{ProjectInput, ScreenshotAsset};
use portfolio_rs::repositories::ProjectRepository;
use portfolio_rs::services::{CleanupOutcome, ScreenshotStatus};
use portfolio_rs::test_utils::{test_app_state, AssetCall, FakeAssetStore, FakeRenderer};
use std::sync::Arc;

const SCREENSHOT_FOLDER: &str = "portfolio/screenshots";

fn project(title: &str, live_url: Option<&str>) -> ProjectInput {
    ProjectInput {
        title: title.to_string(),
        year: "2024".to_string(),
        category: "Web".to_string(),
        live_url: live_url.map(str::to_string),
        ..ProjectInput::default()
    }
}

async fn setup() -> Result<(AppState, Arc<FakeRenderer>, Arc<FakeAssetStore>)> {
    let renderer = FakeRenderer::new();
    let assets = FakeAssetStore::new();
    let state = test_app_state(renderer.clone(), assets.clone()).await?;
    Ok((state, renderer, assets))
}

#[tokio::test]
async fn test_create_with_live_url_stores_screenshot_pair() -> Result<()> {
    let (state, renderer, assets) = setup().await?;

    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;

    assert!(saved.screenshot_generated);
    let asset = saved.project.screenshot.expect("screenshot pair should be set");
    assert!(asset.public_id.starts_with(SCREENSHOT_FOLDER));
    assert!(assets.contains(&asset.public_id));
    assert_eq!(renderer.captured(), vec!["https://x.test".to_string()]);
    assert_eq!(assets.calls(), vec![AssetCall::Upload { folder: SCREENSHOT_FOLDER.to_string() }]);

    Ok(())
}

#[tokio::test]
async fn test_create_without_live_url_skips_renderer() -> Result<()> {
    let (state, renderer, assets) = setup().await?;

    let saved = state.projects().create(project("Offline", None)).await?;

    assert!(!saved.screenshot_generated);
    assert!(saved.project.screenshot.is_none());
    assert!(renderer.captured().is_empty());
    assert!(assets.calls().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_renderer_failure_still_creates_project() -> Result<()> {
    let renderer = FakeRenderer::failing();
    let assets = FakeAssetStore::new();
    let state = test_app_state(renderer.clone(), assets.clone()).await?;

    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;

    assert!(!saved.screenshot_generated);
    assert!(saved.project.screenshot.is_none());
    assert!(assets.calls().is_empty(), "nothing is uploaded after a failed capture");

    let stored = ProjectRepository::new(&state.database).get(&saved.project.id).await?;
    assert!(stored.expect("project should exist").screenshot.is_none());

    Ok(())
}

#[tokio::test]
async fn test_upload_failure_leaves_pair_absent() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    assets.set_fail_upload(true);

    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;

    assert!(!saved.screenshot_generated);
    assert!(saved.project.screenshot.is_none());

    Ok(())
}

#[tokio::test]
async fn test_regenerate_deletes_previous_asset_before_persisting_new_one() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;
    let first = saved.project.screenshot.clone().expect("first screenshot");

    let result = state.screenshots().regenerate(&saved.project).await;
    assert!(result.is_success());

    let ScreenshotStatus::Success { cloudinary_id, .. } = &result.status else {
        panic!("expected success, got {:?}", result.status);
    };
    assert_ne!(cloudinary_id, &first.public_id);
    assert!(!assets.contains(&first.public_id));
    assert!(assets.contains(cloudinary_id));

    let folder = SCREENSHOT_FOLDER.to_string();
    assert_eq!(
        assets.calls(),
        vec![
            AssetCall::Upload { folder: folder.clone() },
            AssetCall::Upload { folder },
            AssetCall::Destroy(first.public_id.clone()),
        ]
    );

    let stored = ProjectRepository::new(&state.database)
        .get(&saved.project.id)
        .await?
        .expect("project should exist");
    assert_eq!(stored.screenshot_public_id(), Some(cloudinary_id.as_str()));

    Ok(())
}

#[tokio::test]
async fn test_old_asset_cleanup_failure_does_not_block_refresh() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;
    assets.set_fail_destroy(true);

    let refreshed = state
        .screenshots()
        .refresh(&saved.project)
        .await?
        .expect("project has a live URL");

    assert!(refreshed.previous_cleanup.is_failed());
    let stored = ProjectRepository::new(&state.database)
        .get(&saved.project.id)
        .await?
        .expect("project should exist");
    assert_eq!(stored.screenshot, Some(refreshed.asset));

    Ok(())
}

#[tokio::test]
async fn test_bulk_regeneration_reports_every_project() -> Result<()> {
    let (state, renderer, _assets) = setup().await?;
    let projects = state.projects();
    projects.create(project("A", Some("https://a.test"))).await?;
    projects.create(project("B", Some("https://b.test"))).await?;
    projects.create(project("C", Some("https://c.test"))).await?;
    projects.create(project("No URL", None)).await?;

    renderer.set_failing(true);
    let failed = state.screenshots().regenerate_all().await?;
    assert_eq!(failed.results.len(), 3);
    assert_eq!(failed.summary.total, 3);
    assert_eq!(failed.summary.failed, 3);
    assert_eq!(failed.summary.successful, 0);

    renderer.set_failing(false);
    let report = state.screenshots().regenerate_all().await?;
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.summary.successful, 3);
    assert_eq!(report.summary.failed, 0);
    assert!(report.results.iter().all(|r| r.is_success()));

    Ok(())
}

#[tokio::test]
async fn test_update_with_new_live_url_regenerates() -> Result<()> {
    let (state, renderer, assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://old.test"))).await?;
    let old = saved.project.screenshot.clone().expect("initial screenshot");

    let updated = state
        .projects()
        .update(&saved.project.id, project("X", Some("https://new.test")))
        .await?
        .expect("project should exist");

    assert!(updated.screenshot_generated);
    assert_eq!(renderer.captured().last().map(String::as_str), Some("https://new.test"));
    assert!(!assets.contains(&old.public_id));
    assert_ne!(updated.project.screenshot, Some(old));

    Ok(())
}

#[tokio::test]
async fn test_update_with_same_live_url_keeps_screenshot() -> Result<()> {
    let (state, renderer, _assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;

    let updated = state
        .projects()
        .update(&saved.project.id, project("Renamed", Some("https://x.test")))
        .await?
        .expect("project should exist");

    assert!(!updated.screenshot_generated);
    assert_eq!(renderer.captured().len(), 1);
    assert_eq!(updated.project.screenshot, saved.project.screenshot);

    Ok(())
}

#[tokio::test]
async fn test_update_clearing_live_url_discards_screenshot() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;
    let old = saved.project.screenshot.clone().expect("initial screenshot");

    let updated = state
        .projects()
        .update(&saved.project.id, project("X", None))
        .await?
        .expect("project should exist");

    assert!(!updated.screenshot_generated);
    assert!(updated.project.screenshot.is_none());
    assert_eq!(assets.destroyed(), vec![old.public_id]);

    Ok(())
}

#[tokio::test]
async fn test_delete_issues_single_destroy() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;
    let asset = saved.project.screenshot.clone().expect("screenshot");

    let deleted = state.projects().delete(&saved.project.id).await?.expect("project should exist");

    assert_eq!(deleted.cleanup, CleanupOutcome::Deleted);
    assert_eq!(assets.destroyed(), vec![asset.public_id]);
    assert!(ProjectRepository::new(&state.database).get(&saved.project.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_delete_succeeds_when_cdn_cleanup_fails() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let saved = state.projects().create(project("X", Some("https://x.test"))).await?;
    assets.set_fail_destroy(true);

    let deleted = state.projects().delete(&saved.project.id).await?.expect("project should exist");

    assert!(deleted.cleanup.is_failed());
    assert!(ProjectRepository::new(&state.database).get(&saved.project.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_delete_without_screenshot_skips_cleanup() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let saved = state.projects().create(project("Offline", None)).await?;

    let deleted = state.projects().delete(&saved.project.id).await?.expect("project should exist");

    assert_eq!(deleted.cleanup, CleanupOutcome::Skipped);
    assert!(assets.destroyed().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_remove_clears_pair_together() -> Result<()> {
    let (state, _renderer, _assets) = setup().await?;
    let repo = ProjectRepository::new(&state.database);
    let created = repo.create(project("Manual", None)).await?;
    let asset = ScreenshotAsset {
        url: "https://cdn.test/manual.webp".to_string(),
        public_id: "portfolio/screenshots/manual".to_string(),
    };
    repo.set_screenshot(&created.id, &asset).await?;
    let with_asset = repo.get(&created.id).await?.expect("project should exist");

    let outcome = state.screenshots().remove(&with_asset).await?;

    assert_eq!(outcome, CleanupOutcome::Deleted);
    assert!(repo.get(&created.id).await?.expect("project should exist").screenshot.is_none());

    Ok(())
}

#[tokio::test]
async fn test_refresh_of_deleted_project_fails_and_leaves_upload_orphaned() -> Result<()> {
    let (state, _renderer, assets) = setup().await?;
    let repository = ProjectRepository::new(&state.database);

    let created = repository.create(project("Gone", Some("https://gone.test"))).await?;
    let loaded = repository.get(&created.id).await?.expect("project exists");
    assert!(repository.delete(&created.id).await?);

    let result = state.screenshots().refresh(&loaded).await;
    let error = result.expect_err("persisting onto a deleted project fails");
    assert!(format!("{:#}", error).contains("no longer exists"));

    let uploaded = assets.stored_ids();
    assert_eq!(uploaded.len(), 1);
    assert!(uploaded[0].starts_with(SCREENSHOT_FOLDER));

    let stats = state.media().stats().await?;
    assert_eq!(stats.orphaned, uploaded);

    assert!(repository.get(&created.id).await?.is_none());
    assert!(repository.list().await?.is_empty(), "no document is written for the deleted project");

    Ok(())
}
