use serde::{Deserialize, Serialize};

/// A user profile as persisted in the `users` collection.
///
/// Credentials live in the auth module's own collection; this document
/// is the public profile everything else resolves ids against.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
}
