// ABOUTME: User and user-group types shared between the store and its callers.
// ABOUTME: Roles are stored as lowercase text; tag and source sets travel as string lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Access level of an account. Exactly one owner is seeded on first boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// A user as seen by the admin config: everything except the secret.
///
/// `tags` and `enabled_apis` are `None` when the user has never had them set,
/// which callers treat as "no restriction" rather than "empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_apis: Option<Vec<String>>,
}

impl UserRecord {
    /// A plain `user` role account with no tags or source restrictions.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::User,
            banned: false,
            tags: None,
            enabled_apis: None,
        }
    }
}

/// A user row including its stored secret, as produced by a listing with
/// secrets included and consumed by restore.
///
/// `password` holds the stored secret verbatim (salted hash plus salt), never
/// the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    #[serde(flatten)]
    pub user: UserRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A named tag that grants a set of content sources to every user carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub name: String,
    #[serde(default)]
    pub enabled_apis: Vec<String>,
}
