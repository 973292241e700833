use chrono::Utc;
use serde_json::json;

use super::{from_document, from_documents, to_document};
use crate::database::{Collection, CollectionName, Database, FindOptions, SortOrder, StoreError};
use crate::models::{Experience, ExperienceInput};

pub struct ExperienceRepository {
    collection: Collection,
}

impl ExperienceRepository {
    pub fn new(database: &Database) -> Self {
        Self { collection: database.collection(CollectionName::Experiences) }
    }

    pub async fn create(&self, input: ExperienceInput) -> Result<Experience, StoreError> {
        let experience = Experience::from_input(input, Utc::now());
        let id = self.collection.insert(to_document(&experience)?).await?;
        Ok(Experience { id, ..experience })
    }

    /// All entries by ascending `orderIndex`.
    pub async fn list(&self) -> Result<Vec<Experience>, StoreError> {
        let options = FindOptions::new().sort("orderIndex", SortOrder::Asc);
        from_documents(self.collection.find(&options).await?)
    }

    pub async fn list_published(&self) -> Result<Vec<Experience>, StoreError> {
        let options = FindOptions::new()
            .filter("isPublished", true)
            .sort("orderIndex", SortOrder::Asc);
        from_documents(self.collection.find(&options).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Experience>, StoreError> {
        self.collection.find_by_id(id).await?.map(from_document).transpose()
    }

    pub async fn update(&self, id: &str, input: ExperienceInput) -> Result<Option<Experience>, StoreError> {
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

    pub async fn toggle_publish(&self, id: &str) -> Result<Option<bool>, StoreError> {
        let Some(experience) = self.get(id).await? else {
            return Ok(None);
        };

        let is_published = !experience.is_published;
        let fields = json!({ "isPublished": is_published, "updatedAt": Utc::now() });
        if !self.collection.update_fields(id, to_document(&fields)?).await? {
            return Ok(None);
        }
        Ok(Some(is_published))
    }

    /// Assigns `orderIndex` from each id's position. Unknown ids are skipped;
    /// returns how many entries were updated.
    pub async fn reorder(&self, ids: &[String]) -> Result<usize, StoreError> {
        let now = Utc::now();
        let patches = ids
            .iter()
            .enumerate()
            .map(|(position, id)| {
                let fields = json!({ "orderIndex": position as i64, "updatedAt": now });
                Ok((id.clone(), to_document(&fields)?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        self.collection.update_fields_many(patches).await
    }
}
