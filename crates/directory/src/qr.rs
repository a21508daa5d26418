use serde::{Deserialize, Serialize};

use wareflow_core::OrgId;

/// A short code printed as a QR label, resolving to an application path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrLink {
    pub code: String,
    pub org_id: OrgId,
    pub target_path: String,
}

impl QrLink {
    pub fn new(code: impl Into<String>, org_id: OrgId, target_path: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            org_id,
            target_path: target_path.into(),
        }
    }
}
