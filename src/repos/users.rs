use log::warn;

use crate::error::StoreError;
use crate::models::User;
use crate::repos::{from_doc, to_doc};
use crate::store::DocumentStore;

const USERS: &str = "users";

#[derive(Clone)]
pub struct UserRepo<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> UserRepo<S> {
    pub fn new(store: S) -> Self {
        UserRepo { store }
    }

    /// Persists a new profile, allocating an id when the caller did not
    /// bring one. Never overwrites an existing document.
    pub async fn create(&self, mut user: User) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut user.id);
        self.store.insert(USERS, &id, to_doc(&user)?).await?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<User, StoreError> {
        match self.store.fetch(USERS, id).await? {
            Some(doc) => from_doc(doc),
            None => Err(StoreError::not_found(USERS, id)),
        }
    }

    /// Resolves what it can: ids that are missing or fail to load are
    /// dropped from the result instead of failing the whole batch.
    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<User>, StoreError> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.fetch(USERS, id).await {
                Ok(Some(doc)) => match from_doc(doc) {
                    Ok(user) => users.push(user),
                    Err(e) => warn!("skipping undecodable user {}: {}", id, e),
                },
                Ok(None) => {}
                Err(e) => warn!("skipping user {}: {}", id, e),
            }
        }
        Ok(users)
    }

    /// Full-document overwrite of an existing profile.
    pub async fn update(&self, user: &User) -> Result<(), StoreError> {
        self.store.replace(USERS, &user.id, to_doc(user)?).await
    }

    /// Idempotent; an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(USERS, id).await
    }
}
