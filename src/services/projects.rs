use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::assets::{discard, AssetStore, CleanupOutcome};
use super::screenshots::ScreenshotService;
use crate::database::{Database, StoreError};
use crate::models::{Project, ProjectInput};
use crate::repositories::ProjectRepository;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProject {
    pub project: Project,
    pub screenshot_generated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletedProject {
    pub cleanup: CleanupOutcome,
}

/// Project CRUD with the screenshot side effects the admin forms expect.
pub struct ProjectService {
    repository: ProjectRepository,
    screenshots: ScreenshotService,
    assets: Arc<dyn AssetStore>,
}

impl ProjectService {
    pub fn new(database: &Database, screenshots: ScreenshotService, assets: Arc<dyn AssetStore>) -> Self {
        Self { repository: ProjectRepository::new(database), screenshots, assets }
    }

    /// Inserts the project, then tries to capture its live URL. A failed
    /// capture leaves the project without a screenshot but still created.
    pub async fn create(&self, input: ProjectInput) -> Result<SavedProject, StoreError> {
        let project = self.repository.create(input).await?;
        info!("Created project {} ({})", project.id, project.title);

        let screenshot_generated = self.try_refresh(&project).await;
        let project = self.reload(project).await?;
        Ok(SavedProject { project, screenshot_generated })
    }

    /// Full-replace update. A changed live URL regenerates the screenshot;
    /// a removed one discards it.
    pub async fn update(&self, id: &str, input: ProjectInput) -> Result<Option<SavedProject>, StoreError> {
        let Some(existing) = self.repository.get(id).await? else {
            return Ok(None);
        };
        let Some(project) = self.repository.update(id, input).await? else {
            return Ok(None);
        };

        let mut screenshot_generated = false;
        if project.live_url() != existing.live_url() {
            if project.live_url().is_some() {
                screenshot_generated = self.try_refresh(&project).await;
            } else if let Err(e) = self.screenshots.remove(&project).await {
                warn!("Failed to clear screenshot of project {}: {:#}", project.id, e);
            }
        }

        let project = self.reload(project).await?;
        Ok(Some(SavedProject { project, screenshot_generated }))
    }

    /// Removes the project, then makes a best-effort attempt to delete its
    /// screenshot from the CDN. The cleanup outcome never fails the deletion.
    pub async fn delete(&self, id: &str) -> Result<Option<DeletedProject>, StoreError> {
        let Some(project) = self.repository.get(id).await? else {
            return Ok(None);
        };
        if !self.repository.delete(id).await? {
            return Ok(None);
        }

        let cleanup = discard(self.assets.as_ref(), project.screenshot_public_id()).await;
        info!("Deleted project {} (asset cleanup: {:?})", id, cleanup);
        Ok(Some(DeletedProject { cleanup }))
    }

    async fn try_refresh(&self, project: &Project) -> bool {
        match self.screenshots.refresh(project).await {
            Ok(Some(_)) => true,
            Ok(None) => false,
            Err(e) => {
                warn!("Screenshot generation failed for project {}: {:#}", project.id, e);
                false
            }
        }
    }

    async fn reload(&self, project: Project) -> Result<Project, StoreError> {
        Ok(self.repository.get(&project.id).await?.unwrap_or(project))
    }
}
