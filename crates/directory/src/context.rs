use wareflow_core::{BranchId, OrgId, UserId};
use wareflow_entitlements::EntitlementsSnapshot;

use crate::{Branch, Organization};

/// Resolved organization/branch context for one request.
///
/// Built once per request by the resolver and passed explicitly; there is no
/// ambient global holding "the current org".
#[derive(Debug, Clone, PartialEq)]
pub struct OrgContext {
    pub user_id: UserId,
    pub org: Organization,
    pub branch: Option<Branch>,
    pub available_branches: Vec<Branch>,

    /// Session-cached entitlements snapshot. May be stale after an
    /// organization switch; the entitlement gate verifies its organization id
    /// before trusting it.
    pub entitlements: Option<EntitlementsSnapshot>,
}

impl OrgContext {
    pub fn org_id(&self) -> OrgId {
        self.org.id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch.as_ref().map(|b| b.id)
    }

    pub fn cached_entitlements(&self) -> Option<&EntitlementsSnapshot> {
        self.entitlements.as_ref()
    }
}
