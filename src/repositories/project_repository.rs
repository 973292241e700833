use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use super::{from_document, from_documents, to_document};
use crate::database::{Collection, CollectionName, Database, FindOptions, StoreError};
use crate::models::{Project, ProjectInput, ScreenshotAsset};

#[derive(Clone)]
pub struct ProjectRepository {
    collection: Collection,
}

impl ProjectRepository {
    pub fn new(database: &Database) -> Self {
        Self { collection: database.collection(CollectionName::Projects) }
    }

    pub async fn create(&self, input: ProjectInput) -> Result<Project, StoreError> {
        let project = Project::from_input(input, Utc::now());
        let id = self.collection.insert(to_document(&project)?).await?;
        debug!("Created project {} ({})", id, project.title);
        Ok(Project { id, ..project })
    }

    /// All projects, newest first.
    pub async fn list(&self) -> Result<Vec<Project>, StoreError> {
        from_documents(self.collection.find(&FindOptions::new()).await?)
    }

    pub async fn list_published(&self) -> Result<Vec<Project>, StoreError> {
        let options = FindOptions::new().filter("isPublished", true);
        from_documents(self.collection.find(&options).await?)
    }

    pub async fn list_with_live_url(&self) -> Result<Vec<Project>, StoreError> {
        let projects = self.list().await?;
        Ok(projects.into_iter().filter(|p| p.live_url().is_some()).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.collection.find_by_id(id).await?.map(from_document).transpose()
    }

    /// Replaces every form field of the project. Returns `None` when it does not exist.
    pub async fn update(&self, id: &str, input: ProjectInput) -> Result<Option<Project>, StoreError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let updated = existing.replaced_with(input, Utc::now());
        if !self.collection.replace(id, to_document(&updated)?).await? {
            return Ok(None);
        }
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.collection.delete(id).await
    }

    /// Flips the publish flag and returns the new value. Not atomic against
    /// concurrent togglers; the later write wins.
    pub async fn toggle_publish(&self, id: &str) -> Result<Option<bool>, StoreError> {
        let Some(project) = self.get(id).await? else {
            return Ok(None);
        };

        let is_published = !project.is_published;
        let fields = json!({ "isPublished": is_published, "updatedAt": Utc::now() });
        if !self.collection.update_fields(id, to_document(&fields)?).await? {
            return Ok(None);
        }
        Ok(Some(is_published))
    }

    /// Stores the screenshot URL and CDN id in one write.
    pub async fn set_screenshot(&self, id: &str, asset: &ScreenshotAsset) -> Result<bool, StoreError> {
        let fields = json!({
            "screenshotUrl": asset.url,
            "screenshotCloudinaryId": asset.public_id,
            "updatedAt": Utc::now(),
        });
        self.collection.update_fields(id, to_document(&fields)?).await
    }

    /// Removes the screenshot URL and CDN id in one write.
    pub async fn clear_screenshot(&self, id: &str) -> Result<bool, StoreError> {
        let fields = json!({
            "screenshotUrl": Value::Null,
            "screenshotCloudinaryId": Value::Null,
            "updatedAt": Utc::now(),
        });
        self.collection.update_fields(id, to_document(&fields)?).await
    }

    /// Clears the screenshot pair on every project that has one and returns how many changed.
    pub async fn clear_all_screenshots(&self) -> Result<usize, StoreError> {
        let mut cleared = 0;
        for project in self.list().await? {
            if project.screenshot.is_some() && self.clear_screenshot(&project.id).await? {
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}
