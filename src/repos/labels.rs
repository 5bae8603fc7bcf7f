use log::warn;
use mongodb::bson::doc;

use crate::error::StoreError;
use crate::models::Label;
use crate::repos::{from_doc, to_doc};
use crate::store::DocumentStore;

const LABELS: &str = "labels";

#[derive(Clone)]
pub struct LabelRepo<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> LabelRepo<S> {
    pub fn new(store: S) -> Self {
        LabelRepo { store }
    }

    pub async fn create(&self, mut label: Label) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut label.id);
        self.store.insert(LABELS, &id, to_doc(&label)?).await?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Label, StoreError> {
        match self.store.fetch(LABELS, id).await? {
            Some(doc) => from_doc(doc),
            None => Err(StoreError::not_found(LABELS, id)),
        }
    }

    /// Resolves what it can; dangling ids left behind by label deletion
    /// are dropped from the result, never an error.
    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Label>, StoreError> {
        let mut labels = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.fetch(LABELS, id).await {
                Ok(Some(doc)) => match from_doc(doc) {
                    Ok(label) => labels.push(label),
                    Err(e) => warn!("skipping undecodable label {}: {}", id, e),
                },
                Ok(None) => {}
                Err(e) => warn!("skipping label {}: {}", id, e),
            }
        }
        Ok(labels)
    }

    /// Labels the user owns.
    pub async fn get_for_user(&self, user_id: &str) -> Result<Vec<Label>, StoreError> {
        let docs = self
            .store
            .find(LABELS, doc! { "userId": user_id }, None)
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    /// Shared labels of a group (compound equality on `groupId` and
    /// `isShared`).
    pub async fn get_shared_for_group(&self, group_id: &str) -> Result<Vec<Label>, StoreError> {
        let docs = self
            .store
            .find(LABELS, doc! { "groupId": group_id, "isShared": true }, None)
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    /// Full-document overwrite.
    pub async fn update(&self, label: &Label) -> Result<(), StoreError> {
        self.store.replace(LABELS, &label.id, to_doc(label)?).await
    }

    /// Idempotent; an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(LABELS, id).await
    }
}
