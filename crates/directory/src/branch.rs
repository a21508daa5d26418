use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{BranchId, OrgId};

/// A branch (location) of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub org_id: OrgId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    pub fn new(
        id: BranchId,
        org_id: OrgId,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            org_id,
            name: name.into(),
            created_at,
        }
    }
}
