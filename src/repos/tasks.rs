use std::collections::HashMap;

use mongodb::bson::doc;

use crate::error::StoreError;
use crate::models::Task;
use crate::repos::{from_doc, to_bson_value, to_doc};
use crate::store::DocumentStore;

const TASKS: &str = "tasks";

/// Request builder over the `tasks` collection.
///
/// Mutations come in two shapes: full-document overwrites for create and
/// update, and three named partial patches (completion flag, assignment,
/// confirmations) that leave every other field untouched.
#[derive(Clone)]
pub struct TaskRepo<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> TaskRepo<S> {
    pub fn new(store: S) -> Self {
        TaskRepo { store }
    }

    pub async fn create(&self, mut task: Task) -> Result<String, StoreError> {
        let id = super::ensure_id(&mut task.id);
        self.store.insert(TASKS, &id, to_doc(&task)?).await?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Task, StoreError> {
        match self.store.fetch(TASKS, id).await? {
            Some(doc) => from_doc(doc),
            None => Err(StoreError::not_found(TASKS, id)),
        }
    }

    /// Tasks the user created, personal and group alike.
    pub async fn get_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let docs = self
            .store
            .find(TASKS, doc! { "userId": user_id }, None)
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    pub async fn get_for_group(&self, group_id: &str) -> Result<Vec<Task>, StoreError> {
        let docs = self
            .store
            .find(TASKS, doc! { "groupId": group_id }, None)
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    /// Group tasks whose assignee list contains the user.
    pub async fn get_assigned_to(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let docs = self
            .store
            .find(TASKS, doc! { "assignedTo": user_id }, None)
            .await?;
        docs.into_iter().map(from_doc).collect()
    }

    /// Full-document overwrite.
    pub async fn update(&self, task: &Task) -> Result<(), StoreError> {
        self.store.replace(TASKS, &task.id, to_doc(task)?).await
    }

    /// Patches only the completion flag.
    pub async fn set_completed(&self, id: &str, completed: bool) -> Result<(), StoreError> {
        self.store
            .update_fields(TASKS, id, doc! { "isCompleted": completed })
            .await
    }

    /// Patches the assignee list and the confirmations map in one call.
    pub async fn set_assignment(
        &self,
        id: &str,
        assigned_to: &[String],
        confirmations: &HashMap<String, bool>,
    ) -> Result<(), StoreError> {
        let fields = doc! {
            "assignedTo": assigned_to.to_vec(),
            "completionConfirmations": to_bson_value(confirmations)?,
        };
        self.store.update_fields(TASKS, id, fields).await
    }

    /// Patches only the confirmations map.
    pub async fn set_confirmations(
        &self,
        id: &str,
        confirmations: &HashMap<String, bool>,
    ) -> Result<(), StoreError> {
        let fields = doc! { "completionConfirmations": to_bson_value(confirmations)? };
        self.store.update_fields(TASKS, id, fields).await
    }

    /// Idempotent; an absent id is not an error.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(TASKS, id).await
    }
}
