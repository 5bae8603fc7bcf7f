use mongodb::bson::doc;

use crate::error::StoreError;
use crate::models::Group;
use crate::repos::{from_doc, to_doc};
use crate::store::DocumentStore;

const GROUPS: &str = "groups";

#[derive(Clone)]
pub struct GroupRepo<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> GroupRepo<S> {
    pub fn new(store: S) -> Self {
        GroupRepo { store }
    }

    pub async fn create(&self, mut group: Group) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut group.id);
        self.store.insert(GROUPS, &id, to_doc(&group)?).await?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Group, StoreError> {
        match self.store.fetch(GROUPS, id).await? {
            Some(doc) => from_doc(doc),
            None => Err(StoreError::not_found(GROUPS, id)),
        }
    }

    /// Groups the user belongs to (array-contains on `members`).
    pub async fn get_for_member(&self, user_id: &str) -> Result<Vec<Group>, StoreError> {
        let docs = self
            .store
            .find(GROUPS, doc! { "members": user_id }, None)
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    /// Full-document overwrite.
    pub async fn update(&self, group: &Group) -> Result<(), StoreError> {
        self.store.replace(GROUPS, &group.id, to_doc(group)?).await
    }

    /// Idempotent; an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(GROUPS, id).await
    }
}
