pub mod admin_repository;
pub mod experience_repository;
pub mod project_repository;
pub mod skill_repository;

pub use admin_repository::*;
pub use experience_repository::*;
pub use project_repository::*;
pub use skill_repository::*;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::database::{Document, StoreError};

pub(crate) fn to_document<T: Serialize>(entity: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(entity)? {
        Value::Object(doc) => Ok(doc),
        _ => Err(StoreError::NotAnObject),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

pub(crate) fn from_documents<T: DeserializeOwned>(docs: Vec<Document>) -> Result<Vec<T>, StoreError> {
    docs.into_iter().map(from_document).collect()
}
