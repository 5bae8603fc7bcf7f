use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-group authorization level of a user.
///
/// Leader is reserved for the group creator; Deputy and Member are the
/// two levels the role-change flow may assign.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Deputy,
    Member,
}

/// A group as persisted in the `groups` collection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_by: String,
    /// Ordered member ids. Set semantics are enforced by the mutation
    /// paths, not the store; `created_by` is always present.
    pub members: Vec<String>,
    pub created_at: i64,
    /// Explicit role assignments. Anyone absent here is a plain Member.
    #[serde(default)]
    pub member_roles: HashMap<String, Role>,
}

impl Group {
    /// The role `user_id` holds in this group. The creator is always the
    /// Leader regardless of the role map; everyone else falls back to
    /// Member when no entry exists.
    pub fn member_role(&self, user_id: &str) -> Role {
        if user_id == self.created_by {
            Role::Leader
        } else {
            self.member_roles
                .get(user_id)
                .copied()
                .unwrap_or(Role::Member)
        }
    }

    /// Whether `user_id` may create and assign tasks in this group.
    pub fn can_manage_tasks(&self, user_id: &str) -> bool {
        matches!(self.member_role(user_id), Role::Leader | Role::Deputy)
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}
