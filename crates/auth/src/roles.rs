use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for scoped RBAC.
///
/// Roles are intentionally opaque strings at this layer; which roles exist
/// and what they allow is decided by the call sites constructing checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role names with built-in meaning to the application.
pub mod well_known {
    use super::Role;

    /// Full control over an organization, including its settings and branches.
    pub const ORG_OWNER: Role = Role::from_static("org_owner");

    /// Organization-wide administration (branches, warehouses, units).
    pub const ORG_ADMIN: Role = Role::from_static("org_admin");

    /// Day-to-day management of a single branch.
    pub const BRANCH_MANAGER: Role = Role::from_static("branch_manager");

    /// Operational access within a branch.
    pub const STAFF: Role = Role::from_static("staff");
}
