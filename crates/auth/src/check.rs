use uuid::Uuid;

use wareflow_core::{BranchId, OrgId};

use crate::{Role, RoleAssignment, RoleScope};

/// Scope requirement of a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    /// The role must be held at organization scope on this organization.
    Org(OrgId),
    /// The role must be held at branch scope on this branch.
    Branch(BranchId),
    /// Any scope satisfies the check (role name alone).
    Any,
    /// Any scope whose id equals the given id satisfies the check.
    AnyId(Uuid),
}

/// A single requirement a caller's role assignments are tested against.
///
/// Constructed per call site; an action names the grants that would allow it
/// and passes them to [`crate::has_matching_role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCheck {
    pub role: Role,
    pub scope: ScopeFilter,
}

impl RoleCheck {
    pub fn org(role: Role, org_id: OrgId) -> Self {
        Self {
            role,
            scope: ScopeFilter::Org(org_id),
        }
    }

    pub fn branch(role: Role, branch_id: BranchId) -> Self {
        Self {
            role,
            scope: ScopeFilter::Branch(branch_id),
        }
    }

    pub fn any(role: Role) -> Self {
        Self {
            role,
            scope: ScopeFilter::Any,
        }
    }

    pub fn any_id(role: Role, id: Uuid) -> Self {
        Self {
            role,
            scope: ScopeFilter::AnyId(id),
        }
    }

    /// Whether `assignment` satisfies this check.
    ///
    /// Role names must be equal, and the scope requirement must hold: an
    /// org-scoped check only matches an org-scoped assignment with the same
    /// id (likewise for branch scope), while `Any`/`AnyId` accept either
    /// scope kind.
    pub fn is_satisfied_by(&self, assignment: &RoleAssignment) -> bool {
        if self.role != assignment.role {
            return false;
        }

        match (self.scope, assignment.scope) {
            (ScopeFilter::Org(required), RoleScope::Org(held)) => required == held,
            (ScopeFilter::Branch(required), RoleScope::Branch(held)) => required == held,
            (ScopeFilter::Org(_), RoleScope::Branch(_)) => false,
            (ScopeFilter::Branch(_), RoleScope::Org(_)) => false,
            (ScopeFilter::Any, _) => true,
            (ScopeFilter::AnyId(id), scope) => scope.id() == id,
        }
    }
}
