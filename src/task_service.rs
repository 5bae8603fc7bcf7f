// src/task_service.rs

use std::collections::HashSet;

use log::info;

use crate::error::ServiceError;
use crate::models::{Notification, Task, TaskKind};
use crate::repos::{GroupRepo, NotificationRepo, TaskRepo};
use crate::store::DocumentStore;

/// Orchestrates task mutations and the notification fan-out they imply.
///
/// The primary entity write always propagates failure to the caller. The
/// notification writes that follow it go through
/// [`NotificationRepo::send_best_effort`] and never do; a notification
/// outage must not block a task mutation.
#[derive(Clone)]
pub struct TaskService<S: DocumentStore> {
    tasks: TaskRepo<S>,
    groups: GroupRepo<S>,
    notifications: NotificationRepo<S>,
}

impl<S: DocumentStore> TaskService<S> {
    pub fn new(
        tasks: TaskRepo<S>,
        groups: GroupRepo<S>,
        notifications: NotificationRepo<S>,
    ) -> Self {
        TaskService {
            tasks,
            groups,
            notifications,
        }
    }

    /// Validates and persists a new task, then fans out notifications.
    ///
    /// Group tasks require the creator to hold task-management rights in
    /// the group and every assignee to be a member; the assignee list is
    /// deduplicated before it is stored. Returns the task with its
    /// allocated id.
    pub async fn create_task(&self, mut task: Task) -> Result<Task, ServiceError> {
        if task.title.trim().is_empty() {
            return Err(ServiceError::invalid("Task title cannot be empty"));
        }

        if let TaskKind::Group {
            group_id,
            assigned_to,
        } = &mut task.kind
        {
            let group = self.groups.get_by_id(group_id).await?;
            if !group.can_manage_tasks(&task.user_id) {
                return Err(ServiceError::forbidden(
                    "Only leaders and deputies can create group tasks",
                ));
            }
            dedup_in_place(assigned_to);
            for assignee in assigned_to.iter() {
                if !group.is_member(assignee) {
                    return Err(ServiceError::invalid(format!(
                        "{} is not a member of the group",
                        assignee
                    )));
                }
            }
        }

        let id = self.tasks.create(task.clone()).await?;
        task.id = id;
        info!("created task {} for user {}", task.id, task.user_id);

        if task.due_date > 0 {
            self.notify_deadline(&task).await;
        }
        for assignee in task.assignees() {
            if assignee != &task.user_id {
                self.notifications
                    .send_best_effort(Notification::task_assigned(&task, assignee))
                    .await;
            }
        }

        Ok(task)
    }

    /// Full-document overwrite, then a fresh round of deadline reminders
    /// when a due date is set.
    pub async fn update_task(&self, task: Task) -> Result<(), ServiceError> {
        if task.title.trim().is_empty() {
            return Err(ServiceError::invalid("Task title cannot be empty"));
        }

        self.tasks.update(&task).await?;

        // TODO: every update re-sends deadline reminders even when the due
        // date did not change; confirm whether this should only fire on a
        // due-date change before tightening it.
        if task.due_date > 0 {
            self.notify_deadline(&task).await;
        }
        Ok(())
    }

    /// Removes the task's notifications first, then the task itself.
    /// Both steps are idempotent, so deleting an already-deleted id is
    /// not an error.
    pub async fn delete_task(&self, task_id: &str) -> Result<(), ServiceError> {
        let removed = self.notifications.delete_for_task(task_id).await?;
        if removed > 0 {
            info!("removed {} notifications for task {}", removed, task_id);
        }
        self.tasks.delete(task_id).await?;
        Ok(())
    }

    /// Deletes every task of a group, routing each through
    /// [`delete_task`](Self::delete_task) so per-task notification
    /// cleanup happens. Independent steps, no transaction.
    pub async fn delete_tasks_for_group(&self, group_id: &str) -> Result<(), ServiceError> {
        let tasks = self.tasks.get_for_group(group_id).await?;
        let count = tasks.len();
        for task in &tasks {
            self.delete_task(&task.id).await?;
        }
        if count > 0 {
            info!("deleted {} tasks of group {}", count, group_id);
        }
        Ok(())
    }

    /// Patches only the completion flag. A false-to-true flip of a group
    /// task notifies every assignee except the acting user.
    pub async fn set_completed(
        &self,
        task_id: &str,
        completed: bool,
        acting_user: &str,
    ) -> Result<Task, ServiceError> {
        let mut task = self.tasks.get_by_id(task_id).await?;
        self.tasks.set_completed(task_id, completed).await?;

        let newly_completed = completed && !task.is_completed;
        task.is_completed = completed;

        if newly_completed && task.is_group_task() {
            for assignee in task.assignees() {
                if assignee != acting_user {
                    self.notifications
                        .send_best_effort(Notification::task_completed(&task, assignee))
                        .await;
                }
            }
        }
        Ok(task)
    }

    /// Replaces a group task's assignee list.
    ///
    /// Confirmations are filtered down to the surviving assignees and
    /// nothing is fabricated for new ones; the list and the map land in
    /// one patch. Members assigned for the first time get a "task
    /// assigned" notification, unless `acting_user` is `None`, in which
    /// case the reassignment still commits but the notify step is
    /// skipped entirely.
    pub async fn reassign(
        &self,
        task_id: &str,
        mut new_assigned_to: Vec<String>,
        acting_user: Option<&str>,
    ) -> Result<Task, ServiceError> {
        let mut task = self.tasks.get_by_id(task_id).await?;
        let group_id = match task.group_id() {
            Some(id) => id.to_string(),
            None => return Err(ServiceError::invalid("Cannot reassign a personal task")),
        };

        let group = self.groups.get_by_id(&group_id).await?;
        dedup_in_place(&mut new_assigned_to);
        for assignee in &new_assigned_to {
            if !group.is_member(assignee) {
                return Err(ServiceError::invalid(format!(
                    "{} is not a member of the group",
                    assignee
                )));
            }
        }

        let newly_assigned: Vec<String> = new_assigned_to
            .iter()
            .filter(|a| !task.assignees().contains(a))
            .cloned()
            .collect();

        task.completion_confirmations
            .retain(|user, _| new_assigned_to.contains(user));
        self.tasks
            .set_assignment(task_id, &new_assigned_to, &task.completion_confirmations)
            .await?;
        task.kind = TaskKind::Group {
            group_id,
            assigned_to: new_assigned_to,
        };

        if acting_user.is_some() {
            for assignee in &newly_assigned {
                self.notifications
                    .send_best_effort(Notification::task_assigned(&task, assignee))
                    .await;
            }
        }
        Ok(task)
    }

    /// Records one assignee's confirmation. The map is maintained
    /// faithfully but nothing aggregates it into an overall verdict.
    pub async fn confirm_completion(
        &self,
        task_id: &str,
        user_id: &str,
        confirmed: bool,
    ) -> Result<Task, ServiceError> {
        let mut task = self.tasks.get_by_id(task_id).await?;
        task.completion_confirmations
            .insert(user_id.to_string(), confirmed);
        self.tasks
            .set_confirmations(task_id, &task.completion_confirmations)
            .await?;
        Ok(task)
    }

    /// Resets the confirmation map to `false` for every current assignee.
    pub async fn reset_confirmations(&self, task_id: &str) -> Result<Task, ServiceError> {
        let mut task = self.tasks.get_by_id(task_id).await?;
        task.completion_confirmations = task
            .assignees()
            .iter()
            .map(|assignee| (assignee.clone(), false))
            .collect();
        self.tasks
            .set_confirmations(task_id, &task.completion_confirmations)
            .await?;
        Ok(task)
    }

    /// Strips a departing member from every task of the group they were
    /// assigned to. Goes through the reassignment path with no acting
    /// user, so confirmations are filtered and nobody is notified.
    pub async fn remove_assignee_in_group(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<(), ServiceError> {
        let tasks = self.tasks.get_for_group(group_id).await?;
        for task in &tasks {
            if task.assignees().iter().any(|a| a == user_id) {
                let remaining: Vec<String> = task
                    .assignees()
                    .iter()
                    .filter(|a| a.as_str() != user_id)
                    .cloned()
                    .collect();
                self.reassign(&task.id, remaining, None).await?;
            }
        }
        Ok(())
    }

    async fn notify_deadline(&self, task: &Task) {
        for recipient in task.deadline_recipients() {
            self.notifications
                .send_best_effort(Notification::deadline(task, recipient))
                .await;
        }
    }
}

/// First occurrence wins, order preserved.
fn dedup_in_place(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain(|value| seen.insert(value.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, NotificationType, Priority, Role};
    use crate::store::memory::MemStore;
    use std::collections::HashMap;

    fn service(store: &MemStore) -> TaskService<MemStore> {
        TaskService::new(
            TaskRepo::new(store.clone()),
            GroupRepo::new(store.clone()),
            NotificationRepo::new(store.clone()),
        )
    }

    /// Group "g-1" led by ana, with ben as deputy and cara as plain member.
    async fn seed_group(store: &MemStore) {
        let group = Group {
            id: "g-1".to_string(),
            name: "Flat 12".to_string(),
            description: String::new(),
            created_by: "ana".to_string(),
            members: vec!["ana".to_string(), "ben".to_string(), "cara".to_string()],
            created_at: 0,
            member_roles: HashMap::from([("ben".to_string(), Role::Deputy)]),
        };
        GroupRepo::new(store.clone()).create(group).await.unwrap();
    }

    fn personal(id: &str, user: &str, due_date: i64) -> Task {
        Task {
            id: id.to_string(),
            title: "Pay rent".to_string(),
            description: String::new(),
            is_completed: false,
            created_at: 1,
            due_date,
            priority: Priority::Medium,
            user_id: user.to_string(),
            kind: TaskKind::Personal,
            labels: vec![],
            completion_confirmations: HashMap::new(),
        }
    }

    fn group_task(id: &str, creator: &str, assignees: &[&str], due_date: i64) -> Task {
        Task {
            kind: TaskKind::Group {
                group_id: "g-1".to_string(),
                assigned_to: assignees.iter().map(|a| a.to_string()).collect(),
            },
            ..personal(id, creator, due_date)
        }
    }

    async fn feed(store: &MemStore, user: &str) -> Vec<Notification> {
        NotificationRepo::new(store.clone())
            .get_for_user(user)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn personal_task_with_due_date_notifies_only_the_creator() {
        let store = MemStore::new();
        let svc = service(&store);

        svc.create_task(personal("", "ana", 50)).await.unwrap();

        let ana = feed(&store, "ana").await;
        assert_eq!(ana.len(), 1);
        assert_eq!(ana[0].notification_type, NotificationType::TaskDeadline);
        assert_eq!(ana[0].related_group_id, None);
        assert_eq!(store.count("notifications"), 1);
    }

    #[tokio::test]
    async fn personal_task_without_due_date_stays_quiet() {
        let store = MemStore::new();
        let svc = service(&store);

        svc.create_task(personal("", "ana", 0)).await.unwrap();

        assert_eq!(store.count("notifications"), 0);
    }

    #[tokio::test]
    async fn group_deadline_fans_out_to_every_assignee_with_group_id() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        svc.create_task(group_task("", "ana", &["ben", "cara"], 50))
            .await
            .unwrap();

        for user in ["ben", "cara"] {
            let reminders: Vec<Notification> = feed(&store, user)
                .await
                .into_iter()
                .filter(|n| n.notification_type == NotificationType::TaskDeadline)
                .collect();
            assert_eq!(reminders.len(), 1, "one reminder for {}", user);
            assert_eq!(reminders[0].related_group_id.as_deref(), Some("g-1"));
        }
        assert!(feed(&store, "ana").await.is_empty());
    }

    #[tokio::test]
    async fn assigned_creator_gets_deadline_but_no_assignment_notice() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        svc.create_task(group_task("", "ana", &["ana", "ben"], 50))
            .await
            .unwrap();

        let ana = feed(&store, "ana").await;
        assert_eq!(ana.len(), 1);
        assert_eq!(ana[0].notification_type, NotificationType::TaskDeadline);

        let mut ben_types: Vec<NotificationType> =
            feed(&store, "ben").await.iter().map(|n| n.notification_type).collect();
        ben_types.sort_by_key(|t| format!("{:?}", t));
        assert_eq!(
            ben_types,
            vec![NotificationType::TaskAssigned, NotificationType::TaskDeadline]
        );
    }

    #[tokio::test]
    async fn create_rejects_blank_title_before_any_write() {
        let store = MemStore::new();
        let svc = service(&store);

        let mut task = personal("", "ana", 0);
        task.title = "   ".to_string();
        let err = svc.create_task(task).await.unwrap_err();

        assert!(matches!(err, ServiceError::Invalid(_)));
        assert_eq!(store.count("tasks"), 0);
    }

    #[tokio::test]
    async fn create_rejects_assignee_outside_the_group() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let err = svc
            .create_task(group_task("", "ana", &["ben", "zoe"], 0))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Invalid(_)));
        assert_eq!(store.count("tasks"), 0);
    }

    #[tokio::test]
    async fn plain_members_cannot_create_group_tasks() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let err = svc
            .create_task(group_task("", "cara", &["cara"], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        // The deputy can.
        svc.create_task(group_task("", "ben", &["cara"], 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_assignees_are_collapsed_before_storing() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ben", "ben"], 0))
            .await
            .unwrap();

        assert_eq!(created.assignees(), &["ben".to_string()]);
        let stored = TaskRepo::new(store.clone())
            .get_by_id(&created.id)
            .await
            .unwrap();
        assert_eq!(stored.assignees(), &["ben".to_string()]);
        assert_eq!(feed(&store, "ben").await.len(), 1);
    }

    #[tokio::test]
    async fn notification_outage_does_not_fail_creation() {
        let store = MemStore::new();
        seed_group(&store).await;
        store.break_writes("notifications");
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ben"], 50))
            .await
            .unwrap();

        assert_eq!(store.count("tasks"), 1);
        assert_eq!(store.count("notifications"), 0);
        assert!(!created.id.is_empty());
    }

    #[tokio::test]
    async fn every_update_re_sends_deadline_reminders() {
        let store = MemStore::new();
        let svc = service(&store);

        let created = svc.create_task(personal("", "ana", 50)).await.unwrap();
        svc.update_task(created).await.unwrap();

        let reminders = feed(&store, "ana").await;
        assert_eq!(reminders.len(), 2);
        assert!(reminders
            .iter()
            .all(|n| n.notification_type == NotificationType::TaskDeadline));
    }

    #[tokio::test]
    async fn delete_removes_task_notifications_and_is_idempotent() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let doomed = svc
            .create_task(group_task("", "ana", &["ben"], 50))
            .await
            .unwrap();
        let kept = svc.create_task(personal("", "ana", 50)).await.unwrap();

        svc.delete_task(&doomed.id).await.unwrap();
        svc.delete_task(&doomed.id).await.unwrap();

        assert_eq!(store.count("tasks"), 1);
        let remaining = feed(&store, "ana").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].related_task_id.as_deref(), Some(kept.id.as_str()));
        assert!(feed(&store, "ben").await.is_empty());
    }

    #[tokio::test]
    async fn reassign_filters_confirmations_and_notifies_only_the_new() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ana", "ben"], 0))
            .await
            .unwrap();
        svc.confirm_completion(&created.id, "ana", true).await.unwrap();
        svc.confirm_completion(&created.id, "ben", false).await.unwrap();
        let before = feed(&store, "ben").await.len();

        let updated = svc
            .reassign(
                &created.id,
                vec!["ben".to_string(), "cara".to_string()],
                Some("ana"),
            )
            .await
            .unwrap();

        assert_eq!(
            updated.completion_confirmations,
            HashMap::from([("ben".to_string(), false)])
        );
        assert_eq!(
            updated.assignees(),
            &["ben".to_string(), "cara".to_string()]
        );

        let cara = feed(&store, "cara").await;
        assert_eq!(cara.len(), 1);
        assert_eq!(cara[0].notification_type, NotificationType::TaskAssigned);
        assert_eq!(cara[0].related_group_id.as_deref(), Some("g-1"));
        // ben was already assigned, nothing new for him.
        assert_eq!(feed(&store, "ben").await.len(), before);

        let stored = TaskRepo::new(store.clone())
            .get_by_id(&created.id)
            .await
            .unwrap();
        assert_eq!(stored.completion_confirmations, updated.completion_confirmations);
    }

    #[tokio::test]
    async fn reassign_without_actor_commits_but_notifies_nobody() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ben"], 0))
            .await
            .unwrap();
        let before = store.count("notifications");

        let updated = svc
            .reassign(&created.id, vec!["cara".to_string()], None)
            .await
            .unwrap();

        assert_eq!(updated.assignees(), &["cara".to_string()]);
        assert_eq!(store.count("notifications"), before);
    }

    #[tokio::test]
    async fn personal_tasks_cannot_be_reassigned() {
        let store = MemStore::new();
        let svc = service(&store);

        let created = svc.create_task(personal("", "ana", 0)).await.unwrap();
        let err = svc
            .reassign(&created.id, vec!["ben".to_string()], Some("ana"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[tokio::test]
    async fn completing_a_group_task_notifies_the_other_assignees() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ana", "ben"], 0))
            .await
            .unwrap();
        let ben_before = feed(&store, "ben").await.len();

        let updated = svc.set_completed(&created.id, true, "ana").await.unwrap();
        assert!(updated.is_completed);

        let ben_new: Vec<Notification> = feed(&store, "ben")
            .await
            .into_iter()
            .filter(|n| n.notification_type == NotificationType::TaskCompleted)
            .collect();
        assert_eq!(ben_new.len(), 1);
        assert_eq!(feed(&store, "ben").await.len(), ben_before + 1);
        // The actor hears nothing.
        assert!(feed(&store, "ana")
            .await
            .iter()
            .all(|n| n.notification_type != NotificationType::TaskCompleted));
    }

    #[tokio::test]
    async fn re_completing_an_already_completed_task_stays_quiet() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ben"], 0))
            .await
            .unwrap();
        svc.set_completed(&created.id, true, "ana").await.unwrap();
        let before = store.count("notifications");

        svc.set_completed(&created.id, true, "ana").await.unwrap();

        assert_eq!(store.count("notifications"), before);
    }

    #[tokio::test]
    async fn reset_maps_every_assignee_to_false() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let created = svc
            .create_task(group_task("", "ana", &["ana", "ben"], 0))
            .await
            .unwrap();
        svc.confirm_completion(&created.id, "ben", true).await.unwrap();

        let reset = svc.reset_confirmations(&created.id).await.unwrap();

        assert_eq!(
            reset.completion_confirmations,
            HashMap::from([("ana".to_string(), false), ("ben".to_string(), false)])
        );
    }

    #[tokio::test]
    async fn departing_member_is_stripped_from_group_tasks() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        let shared = svc
            .create_task(group_task("", "ana", &["ben", "cara"], 0))
            .await
            .unwrap();
        let solo = svc
            .create_task(group_task("", "ana", &["cara"], 0))
            .await
            .unwrap();
        svc.confirm_completion(&shared.id, "ben", true).await.unwrap();
        let before = store.count("notifications");

        svc.remove_assignee_in_group("g-1", "ben").await.unwrap();

        let repo = TaskRepo::new(store.clone());
        let shared_after = repo.get_by_id(&shared.id).await.unwrap();
        assert_eq!(shared_after.assignees(), &["cara".to_string()]);
        assert!(shared_after.completion_confirmations.is_empty());
        let solo_after = repo.get_by_id(&solo.id).await.unwrap();
        assert_eq!(solo_after.assignees(), &["cara".to_string()]);
        assert_eq!(store.count("notifications"), before);
    }

    #[tokio::test]
    async fn group_cascade_deletes_tasks_and_their_notifications() {
        let store = MemStore::new();
        seed_group(&store).await;
        let svc = service(&store);

        svc.create_task(group_task("", "ana", &["ben"], 50))
            .await
            .unwrap();
        svc.create_task(group_task("", "ana", &["cara"], 50))
            .await
            .unwrap();
        let personal_kept = svc.create_task(personal("", "ana", 50)).await.unwrap();

        svc.delete_tasks_for_group("g-1").await.unwrap();

        assert_eq!(store.count("tasks"), 1);
        let remaining = feed(&store, "ana").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining[0].related_task_id.as_deref(),
            Some(personal_kept.id.as_str())
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let mut values = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];
        dedup_in_place(&mut values);
        assert_eq!(values, vec!["b".to_string(), "a".to_string(), "c".to_string()]);
    }
}
