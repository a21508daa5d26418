use serde::{Deserialize, Serialize};

use wareflow_core::{BranchId, OrgId, UserId};

/// Per-user selection of the active organization and branch.
///
/// Both ids are advisory: the resolver ignores a preferred org the user is no
/// longer a member of, and a preferred branch that left the active org.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: UserId,
    pub active_org_id: Option<OrgId>,
    pub active_branch_id: Option<BranchId>,
}

impl UserPreferences {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            active_org_id: None,
            active_branch_id: None,
        }
    }
}
