//! Profile records from the external profile store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application-level role. Variant order is capability order: `Admin`
/// satisfies any requirement `Member` does, and so on down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Member,
    Admin,
}

impl Role {
    /// Whether this role satisfies `required`.
    #[must_use]
    pub fn grants(self, required: Role) -> bool {
        self >= required
    }
}

/// Row fetched from the external profile store, keyed by the session's
/// user id. May be transiently absent right after signup while the store is
/// still provisioning the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub ban_reason: Option<String>,
}

/// Whether a possibly-missing profile satisfies a role requirement.
///
/// A missing profile grants nothing: an account whose row has not been
/// provisioned yet gets least privilege, never an assumed role.
#[must_use]
pub fn profile_grants(profile: Option<&ProfileRecord>, required: Role) -> bool {
    profile.is_some_and(|p| p.role.grants(required))
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
