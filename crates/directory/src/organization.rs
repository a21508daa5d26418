use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::OrgId;

/// An organization: the multi-tenant boundary everything else hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(id: OrgId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
        }
    }
}
