use log::warn;
use mongodb::bson::doc;

use crate::error::StoreError;
use crate::models::Notification;
use crate::repos::{from_doc, to_doc};
use crate::store::{DocumentStore, SortOrder};

const NOTIFICATIONS: &str = "notifications";

#[derive(Clone)]
pub struct NotificationRepo<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> NotificationRepo<S> {
    pub fn new(store: S) -> Self {
        NotificationRepo { store }
    }

    pub async fn create(&self, mut notification: Notification) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut notification.id);
        self.store
            .insert(NOTIFICATIONS, &id, to_doc(&notification)?)
            .await?;
        Ok(id)
    }

    /// Persists a notification, logging and swallowing any failure.
    /// Task and group flows use this so a notification outage never
    /// rolls back the write that triggered it.
    pub async fn send_best_effort(&self, notification: Notification) {
        let recipient = notification.user_id.clone();
        if let Err(e) = self.create(notification).await {
            warn!("dropping notification for {}: {}", recipient, e);
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Notification, StoreError> {
        match self.store.fetch(NOTIFICATIONS, id).await? {
            Some(doc) => from_doc(doc),
            None => Err(StoreError::not_found(NOTIFICATIONS, id)),
        }
    }

    /// A user's notifications, newest first.
    pub async fn get_for_user(&self, user_id: &str) -> Result<Vec<Notification>, StoreError> {
        let docs = self
            .store
            .find(
                NOTIFICATIONS,
                doc! { "userId": user_id },
                Some(("timestamp", SortOrder::Descending)),
            )
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    pub async fn mark_read(&self, id: &str) -> Result<(), StoreError> {
        self.store
            .update_fields(NOTIFICATIONS, id, doc! { "isRead": true })
            .await
    }

    /// Idempotent; an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(NOTIFICATIONS, id).await
    }

    /// Removes every notification that references the task. Returns
    /// how many were deleted.
    pub async fn delete_for_task(&self, task_id: &str) -> Result<u64, StoreError> {
        self.store
            .delete_where(NOTIFICATIONS, doc! { "relatedTaskId": task_id })
            .await
    }
}
