// src/repos/mod.rs
//
// One repository per entity, each a thin request builder over the
// document store. No repository ever calls another; everything that
// touches more than one collection lives in the services.

pub mod groups;
pub mod labels;
pub mod notifications;
pub mod tasks;
pub mod users;

pub use groups::GroupRepo;
pub use labels::LabelRepo;
pub use notifications::NotificationRepo;
pub use tasks::TaskRepo;
pub use users::UserRepo;

use mongodb::bson::{Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;

pub(crate) fn to_doc<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    mongodb::bson::to_document(value).map_err(|e| StoreError::Encoding(e.to_string()))
}

pub(crate) fn from_doc<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    mongodb::bson::from_document(doc).map_err(|e| StoreError::Encoding(e.to_string()))
}

pub(crate) fn to_bson_value<T: Serialize>(value: &T) -> Result<Bson, StoreError> {
    mongodb::bson::to_bson(value).map_err(|e| StoreError::Encoding(e.to_string()))
}

/// Keeps a caller-provided id, allocating a fresh UUIDv4 otherwise.
pub(crate) fn ensure_id(id: &mut String) -> String {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
    id.clone()
}
