use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{OrgId, UserId};

/// A user's membership in an organization.
///
/// Membership is a directory fact; which roles the user holds there travels
/// in the session token, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    pub org_id: OrgId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}
