//! Request-level authorization guards.
//!
//! Thin wrappers over the pure role matcher, called by every guarded action
//! before it touches the data store.

use wareflow_auth::{AuthError, RoleCheck, has_matching_role, well_known};
use wareflow_core::{BranchId, OrgId};

use crate::context::RequestContext;

/// Deny unless the caller satisfies at least one of `checks`.
///
/// An empty check list always denies; call sites must name the grants that
/// would allow the action.
pub fn require_role(ctx: &RequestContext, checks: &[RoleCheck]) -> Result<(), AuthError> {
    if has_matching_role(ctx.assignments(), checks) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(describe_checks(checks)))
    }
}

/// Checks satisfied by organization-level administrators of `org_id`.
pub fn org_admin_checks(org_id: OrgId) -> Vec<RoleCheck> {
    vec![
        RoleCheck::org(well_known::ORG_OWNER, org_id),
        RoleCheck::org(well_known::ORG_ADMIN, org_id),
    ]
}

/// Org admins plus the manager of `branch_id`.
pub fn branch_manager_checks(org_id: OrgId, branch_id: BranchId) -> Vec<RoleCheck> {
    let mut checks = org_admin_checks(org_id);
    checks.push(RoleCheck::branch(well_known::BRANCH_MANAGER, branch_id));
    checks
}

fn describe_checks(checks: &[RoleCheck]) -> String {
    if checks.is_empty() {
        return "an explicit grant (none specified)".to_string();
    }

    checks
        .iter()
        .map(|c| c.role.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
