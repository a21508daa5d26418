//! Organization/branch context resolution.

use wareflow_core::UserId;
use wareflow_directory::OrgContext;

use crate::stores::DirectoryStore;

/// Load the organization/branch context for `user_id`.
///
/// Returns `None` when the user has no organization membership — an
/// unprovisioned or signed-out caller. Callers must treat `None` as "redirect
/// to sign-in or onboarding"; nothing downstream of this function works
/// without a context.
///
/// The preferred organization is honored only while the user is still a
/// member of it; the preferred branch only while it belongs to the active
/// organization. Otherwise the oldest membership/branch wins.
pub fn resolve_org_context<S>(store: &S, user_id: UserId) -> Option<OrgContext>
where
    S: DirectoryStore + ?Sized,
{
    let memberships = store.memberships_of(user_id);
    if memberships.is_empty() {
        return None;
    }

    let preferences = store.preferences(user_id);

    let preferred_org = preferences.as_ref().and_then(|p| p.active_org_id);
    let active_org_id = preferred_org
        .filter(|org_id| memberships.iter().any(|m| m.org_id == *org_id))
        .unwrap_or(memberships[0].org_id);

    let org = store.organization(active_org_id)?;
    let available_branches = store.branches_of(active_org_id);

    let preferred_branch = preferences.as_ref().and_then(|p| p.active_branch_id);
    let branch = preferred_branch
        .and_then(|branch_id| {
            available_branches
                .iter()
                .find(|b| b.id == branch_id)
                .cloned()
        })
        .or_else(|| available_branches.first().cloned());

    let entitlements = store.session_snapshot(user_id);

    Some(OrgContext {
        user_id,
        org,
        branch,
        available_branches,
        entitlements,
    })
}
