use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wareflow_core::{BranchId, OrgId};

use crate::Role;

/// The level at which a role grant applies.
///
/// Exactly one scope id per assignment. The two legacy wire shapes are
/// collapsed into this variant when claims are decoded (see [`crate::claims`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "scope_id", rename_all = "snake_case")]
pub enum RoleScope {
    Org(OrgId),
    Branch(BranchId),
}

impl RoleScope {
    /// The raw scope identifier, independent of scope kind.
    pub fn id(&self) -> Uuid {
        match self {
            RoleScope::Org(id) => *id.as_uuid(),
            RoleScope::Branch(id) => *id.as_uuid(),
        }
    }
}

/// A role granted to a user at a specific scope.
///
/// Immutable for the lifetime of the session token it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    #[serde(flatten)]
    pub scope: RoleScope,
}

impl RoleAssignment {
    pub fn org(role: Role, org_id: OrgId) -> Self {
        Self {
            role,
            scope: RoleScope::Org(org_id),
        }
    }

    pub fn branch(role: Role, branch_id: BranchId) -> Self {
        Self {
            role,
            scope: RoleScope::Branch(branch_id),
        }
    }
}
