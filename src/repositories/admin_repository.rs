use chrono::Utc;
use serde_json::json;

use super::{from_document, to_document};
use crate::database::{Collection, CollectionName, Database, StoreError};
use crate::models::Admin;

pub struct AdminRepository {
    collection: Collection,
}

impl AdminRepository {
    pub fn new(database: &Database) -> Self {
        Self { collection: database.collection(CollectionName::Admins) }
    }

    pub async fn create_admin(&self, admin: &Admin) -> Result<Admin, StoreError> {
        let id = self.collection.insert(to_document(admin)?).await?;
        Ok(Admin { id, ..admin.clone() })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let email = email.trim().to_lowercase();
        self.collection.find_one("email", email).await?.map(from_document).transpose()
    }

    pub async fn get_admin(&self, id: &str) -> Result<Option<Admin>, StoreError> {
        self.collection.find_by_id(id).await?.map(from_document).transpose()
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<bool, StoreError> {
        let fields = json!({ "passwordHash": password_hash, "updatedAt": Utc::now() });
        self.collection.update_fields(id, to_document(&fields)?).await
    }

    pub async fn count_admins(&self) -> Result<i64, StoreError> {
        self.collection.count().await
    }
}
