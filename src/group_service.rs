// group_service.rs

use chrono::Utc;
use log::info;

use crate::error::ServiceError;
use crate::models::{Group, Notification, Role};
use crate::repos::{GroupRepo, NotificationRepo};
use crate::store::DocumentStore;
use crate::task_service::TaskService;

/// Orchestrates group lifecycle and membership.
///
/// Authorization follows the role model: the creator is the leader,
/// leaders and deputies manage tasks and membership, role changes are
/// the leader's alone. Invitation notifications are best-effort, like
/// every notification write.
#[derive(Clone)]
pub struct GroupService<S: DocumentStore> {
    groups: GroupRepo<S>,
    notifications: NotificationRepo<S>,
    tasks: TaskService<S>,
}

impl<S: DocumentStore> GroupService<S> {
    pub fn new(
        groups: GroupRepo<S>,
        notifications: NotificationRepo<S>,
        tasks: TaskService<S>,
    ) -> Self {
        GroupService {
            groups,
            notifications,
            tasks,
        }
    }

    /// Creates a group with the creator as its leader and only member.
    pub async fn create_group(
        &self,
        name: &str,
        description: String,
        creator: &str,
    ) -> Result<Group, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::invalid("Group name cannot be empty"));
        }

        let mut group = Group {
            id: String::new(),
            name: name.to_string(),
            description,
            created_by: creator.to_string(),
            members: vec![creator.to_string()],
            created_at: Utc::now().timestamp_millis(),
            member_roles: Default::default(),
        };
        group.id = self.groups.create(group.clone()).await?;
        info!("created group {} for user {}", group.id, creator);
        Ok(group)
    }

    /// Renames a group. Leader only.
    pub async fn rename_group(
        &self,
        group_id: &str,
        new_name: &str,
        acting_user: &str,
    ) -> Result<Group, ServiceError> {
        let mut group = self.groups.get_by_id(group_id).await?;
        if group.member_role(acting_user) != Role::Leader {
            return Err(ServiceError::forbidden(
                "Only the group leader can rename the group",
            ));
        }
        if new_name.trim().is_empty() {
            return Err(ServiceError::invalid("Group name cannot be empty"));
        }

        group.name = new_name.to_string();
        self.groups.update(&group).await?;
        Ok(group)
    }

    /// Adds a member and sends them a best-effort invitation notice.
    /// Leaders and deputies only; the member set never gains duplicates.
    pub async fn add_member(
        &self,
        group_id: &str,
        user_id: &str,
        acting_user: &str,
    ) -> Result<Group, ServiceError> {
        let mut group = self.groups.get_by_id(group_id).await?;
        if !group.can_manage_tasks(acting_user) {
            return Err(ServiceError::forbidden(
                "Only leaders and deputies can add members",
            ));
        }
        if group.is_member(user_id) {
            return Err(ServiceError::invalid("User is already a member of the group"));
        }

        group.members.push(user_id.to_string());
        self.groups.update(&group).await?;
        info!("added {} to group {}", user_id, group_id);

        self.notifications
            .send_best_effort(Notification::group_invitation(&group, user_id))
            .await;
        Ok(group)
    }

    /// Removes a member, drops their role entry, and strips them from
    /// every group task they were assigned to. Leaders and deputies
    /// only; the creator can never be removed.
    pub async fn remove_member(
        &self,
        group_id: &str,
        user_id: &str,
        acting_user: &str,
    ) -> Result<Group, ServiceError> {
        let mut group = self.groups.get_by_id(group_id).await?;
        if !group.can_manage_tasks(acting_user) {
            return Err(ServiceError::forbidden(
                "Only leaders and deputies can remove members",
            ));
        }
        if user_id == group.created_by {
            return Err(ServiceError::invalid("The group creator cannot be removed"));
        }
        if !group.is_member(user_id) {
            return Err(ServiceError::invalid("User is not a member of the group"));
        }

        group.members.retain(|member| member != user_id);
        group.member_roles.remove(user_id);
        self.groups.update(&group).await?;
        info!("removed {} from group {}", user_id, group_id);

        self.tasks.remove_assignee_in_group(group_id, user_id).await?;
        Ok(group)
    }

    /// Switches a member between deputy and plain member. Leader only;
    /// the leader role itself is never assignable and the creator's
    /// role never changes.
    pub async fn change_role(
        &self,
        group_id: &str,
        user_id: &str,
        new_role: Role,
        acting_user: &str,
    ) -> Result<Group, ServiceError> {
        let mut group = self.groups.get_by_id(group_id).await?;
        if group.member_role(acting_user) != Role::Leader {
            return Err(ServiceError::forbidden(
                "Only the group leader can change roles",
            ));
        }
        if new_role == Role::Leader {
            return Err(ServiceError::invalid("The leader role cannot be assigned"));
        }
        if user_id == group.created_by {
            return Err(ServiceError::invalid("The creator's role cannot be changed"));
        }
        if !group.is_member(user_id) {
            return Err(ServiceError::invalid("User is not a member of the group"));
        }

        group.member_roles.insert(user_id.to_string(), new_role);
        self.groups.update(&group).await?;
        Ok(group)
    }

    /// Deletes the group after cascading through its tasks (which in
    /// turn clean up their notifications). Creator only. The steps are
    /// independent writes, not a transaction; a failure mid-way leaves
    /// the earlier deletions in place.
    pub async fn delete_group(&self, group_id: &str, acting_user: &str) -> Result<(), ServiceError> {
        let group = self.groups.get_by_id(group_id).await?;
        if acting_user != group.created_by {
            return Err(ServiceError::forbidden(
                "Only the group creator can delete the group",
            ));
        }

        self.tasks.delete_tasks_for_group(group_id).await?;
        self.groups.delete(group_id).await?;
        info!("deleted group {}", group_id);
        Ok(())
    }
}
