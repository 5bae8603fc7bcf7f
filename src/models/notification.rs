// File: notification.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::group::Group;
use crate::models::task::Task;

/// What triggered a notification.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    TaskAssigned,
    TaskCompleted,
    GroupInvitation,
    TaskDeadline,
}

/// A notification as persisted in the `notifications` collection.
///
/// Created only as a side effect of task and group mutations; the one
/// permitted update afterwards is flipping `is_read`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: i64,
    pub is_read: bool,
    /// Recipient.
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_group_id: Option<String>,
}

impl Notification {
    fn new(
        recipient: &str,
        notification_type: NotificationType,
        title: &str,
        message: String,
    ) -> Self {
        Notification {
            id: String::new(),
            title: title.to_string(),
            message,
            timestamp: Utc::now().timestamp_millis(),
            is_read: false,
            user_id: recipient.to_string(),
            notification_type,
            related_task_id: None,
            related_group_id: None,
        }
    }

    /// Deadline reminder for one recipient; group tasks carry the group
    /// id for context.
    pub fn deadline(task: &Task, recipient: &str) -> Self {
        let mut notification = Self::new(
            recipient,
            NotificationType::TaskDeadline,
            "Task deadline",
            format!("'{}' has an upcoming due date", task.title),
        );
        notification.related_task_id = Some(task.id.clone());
        notification.related_group_id = task.group_id().map(str::to_string);
        notification
    }

    pub fn task_assigned(task: &Task, recipient: &str) -> Self {
        let mut notification = Self::new(
            recipient,
            NotificationType::TaskAssigned,
            "Task assigned",
            format!("You have been assigned to '{}'", task.title),
        );
        notification.related_task_id = Some(task.id.clone());
        notification.related_group_id = task.group_id().map(str::to_string);
        notification
    }

    pub fn task_completed(task: &Task, recipient: &str) -> Self {
        let mut notification = Self::new(
            recipient,
            NotificationType::TaskCompleted,
            "Task completed",
            format!("'{}' has been marked as completed", task.title),
        );
        notification.related_task_id = Some(task.id.clone());
        notification.related_group_id = task.group_id().map(str::to_string);
        notification
    }

    pub fn group_invitation(group: &Group, recipient: &str) -> Self {
        let mut notification = Self::new(
            recipient,
            NotificationType::GroupInvitation,
            "Group invitation",
            format!("You have been added to '{}'", group.name),
        );
        notification.related_group_id = Some(group.id.clone());
        notification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{Priority, TaskKind};
    use serde_json::json;
    use std::collections::HashMap;

    fn group_task() -> Task {
        Task {
            id: "t-1".to_string(),
            title: "Review notes".to_string(),
            description: String::new(),
            is_completed: false,
            created_at: 1,
            due_date: 99,
            priority: Priority::High,
            user_id: "u-1".to_string(),
            kind: TaskKind::Group {
                group_id: "g-1".to_string(),
                assigned_to: vec!["u-2".to_string()],
            },
            labels: vec![],
            completion_confirmations: HashMap::new(),
        }
    }

    #[test]
    fn types_serialize_as_screaming_snake_strings() {
        assert_eq!(
            serde_json::to_value(NotificationType::TaskAssigned).unwrap(),
            json!("TASK_ASSIGNED")
        );
        assert_eq!(
            serde_json::to_value(NotificationType::GroupInvitation).unwrap(),
            json!("GROUP_INVITATION")
        );
    }

    #[test]
    fn the_type_field_is_named_type_on_the_wire() {
        let notification = Notification::deadline(&group_task(), "u-2");
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], json!("TASK_DEADLINE"));
        assert_eq!(value["userId"], json!("u-2"));
        assert_eq!(value["isRead"], json!(false));
    }

    #[test]
    fn deadline_for_group_task_references_task_and_group() {
        let notification = Notification::deadline(&group_task(), "u-2");
        assert_eq!(notification.related_task_id.as_deref(), Some("t-1"));
        assert_eq!(notification.related_group_id.as_deref(), Some("g-1"));
        assert!(!notification.is_read);
        assert!(notification.timestamp > 0);
    }

    #[test]
    fn group_invitation_references_only_the_group() {
        let group = Group {
            id: "g-1".to_string(),
            name: "Study group".to_string(),
            description: String::new(),
            created_by: "u-1".to_string(),
            members: vec!["u-1".to_string()],
            created_at: 0,
            member_roles: HashMap::new(),
        };
        let notification = Notification::group_invitation(&group, "u-2");
        assert_eq!(notification.related_group_id.as_deref(), Some("g-1"));
        assert_eq!(notification.related_task_id, None);
        assert_eq!(
            notification.notification_type,
            NotificationType::GroupInvitation
        );
    }
}
