use chrono::Utc;
use serde_json::json;

use super::{from_document, from_documents, to_document};
use crate::database::{Collection, CollectionName, Database, FindOptions, SortOrder, StoreError};
use crate::models::{Skill, SkillInput};

pub struct SkillRepository {
    collection: Collection,
}

impl SkillRepository {
    pub fn new(database: &Database) -> Self {
        Self { collection: database.collection(CollectionName::Skills) }
    }

    pub async fn create(&self, input: SkillInput) -> Result<Skill, StoreError> {
        let skill = Skill::from_input(input, Utc::now());
        let id = self.collection.insert(to_document(&skill)?).await?;
        Ok(Skill { id, ..skill })
    }

    pub async fn list(&self) -> Result<Vec<Skill>, StoreError> {
        let options = FindOptions::new().sort("order", SortOrder::Asc);
        from_documents(self.collection.find(&options).await?)
    }

    pub async fn list_published(&self) -> Result<Vec<Skill>, StoreError> {
        let options = FindOptions::new().filter("published", true).sort("order", SortOrder::Asc);
        from_documents(self.collection.find(&options).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Skill>, StoreError> {
        self.collection.find_by_id(id).await?.map(from_document).transpose()
    }

    pub async fn update(&self, id: &str, input: SkillInput) -> Result<Option<Skill>, StoreError> {
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

    pub async fn reorder(&self, ids: &[String]) -> Result<usize, StoreError> {
        let now = Utc::now();
        let patches = ids
            .iter()
            .enumerate()
            .map(|(position, id)| {
                let fields = json!({ "order": position as i64, "updatedAt": now });
                Ok((id.clone(), to_document(&fields)?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        self.collection.update_fields_many(patches).await
    }
}
