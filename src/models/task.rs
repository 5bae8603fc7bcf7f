use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Task urgency, persisted as the literal integers 1/2/3.
///
/// Numerically smaller is more urgent; sorting and the statistics buckets
/// key off these exact values.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "i32", try_from = "i32")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_i32(self) -> i32 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> i32 {
        priority.as_i32()
    }
}

impl TryFrom<i32> for Priority {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => Err(format!("invalid priority {}", other)),
        }
    }
}

/// Whether a task is personal or belongs to a group.
///
/// Replaces the flat `isGroupTask`/`groupId`/`assignedTo` triplet of the
/// persisted layout: a personal task simply has no group id and no
/// assignee list to get wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskKind {
    Personal,
    Group {
        group_id: String,
        assigned_to: Vec<String>,
    },
}

/// A task as the rest of the code sees it.
///
/// Persisted through [`TaskDoc`], the flat `tasks/{id}` document layout.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "TaskDoc", into = "TaskDoc")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: i64,
    /// Epoch millis; 0 means no due date.
    pub due_date: i64,
    pub priority: Priority,
    /// The creator.
    pub user_id: String,
    pub kind: TaskKind,
    /// Label ids. Weak references: a deleted label may linger here and is
    /// dropped by readers at resolution time.
    pub labels: Vec<String>,
    /// Per-assignee completion confirmations, maintained for group tasks.
    /// Nothing aggregates this map; each entry stands on its own.
    pub completion_confirmations: HashMap<String, bool>,
}

impl Task {
    pub fn is_group_task(&self) -> bool {
        matches!(self.kind, TaskKind::Group { .. })
    }

    pub fn group_id(&self) -> Option<&str> {
        match &self.kind {
            TaskKind::Personal => None,
            TaskKind::Group { group_id, .. } => Some(group_id),
        }
    }

    /// Assignees of a group task; empty for personal tasks.
    pub fn assignees(&self) -> &[String] {
        match &self.kind {
            TaskKind::Personal => &[],
            TaskKind::Group { assigned_to, .. } => assigned_to,
        }
    }

    /// Everyone a deadline reminder goes to: the creator for a personal
    /// task, every assignee for a group task.
    pub fn deadline_recipients(&self) -> &[String] {
        match &self.kind {
            TaskKind::Personal => std::slice::from_ref(&self.user_id),
            TaskKind::Group { assigned_to, .. } => assigned_to,
        }
    }
}

/// The persisted form of [`Task`]: the flat `tasks/{id}` document with
/// `isGroupTask` plus an empty `groupId`/`assignedTo` pair standing in
/// for "personal".
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct TaskDoc {
    #[serde(default)]
    id: String,
    title: String,
    description: String,
    is_completed: bool,
    created_at: i64,
    due_date: i64,
    priority: Priority,
    user_id: String,
    is_group_task: bool,
    #[serde(default)]
    group_id: String,
    #[serde(default)]
    assigned_to: Vec<String>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    completion_confirmations: HashMap<String, bool>,
}

impl From<Task> for TaskDoc {
    fn from(task: Task) -> Self {
        let (is_group_task, group_id, assigned_to) = match task.kind {
            TaskKind::Personal => (false, String::new(), Vec::new()),
            TaskKind::Group {
                group_id,
                assigned_to,
            } => (true, group_id, assigned_to),
        };
        TaskDoc {
            id: task.id,
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
            created_at: task.created_at,
            due_date: task.due_date,
            priority: task.priority,
            user_id: task.user_id,
            is_group_task,
            group_id,
            assigned_to,
            labels: task.labels,
            completion_confirmations: task.completion_confirmations,
        }
    }
}

impl From<TaskDoc> for Task {
    fn from(doc: TaskDoc) -> Self {
        let kind = if doc.is_group_task {
            TaskKind::Group {
                group_id: doc.group_id,
                assigned_to: doc.assigned_to,
            }
        } else {
            TaskKind::Personal
        };
        Task {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            is_completed: doc.is_completed,
            created_at: doc.created_at,
            due_date: doc.due_date,
            priority: doc.priority,
            user_id: doc.user_id,
            kind,
            labels: doc.labels,
            completion_confirmations: doc.completion_confirmations,
        }
    }
}
