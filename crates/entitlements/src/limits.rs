use serde::{Deserialize, Serialize};

/// Key of a numeric plan limit.
///
/// Each key governs one countable resource; the live count comes from the
/// data store, the maximum from the plan snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKey {
    /// Branches (locations) of an organization.
    Branches,
    /// Warehouses across all branches.
    Warehouses,
    /// Organization members.
    Members,
    /// Units of measure.
    Units,
}

impl core::fmt::Display for LimitKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            LimitKey::Branches => "branches",
            LimitKey::Warehouses => "warehouses",
            LimitKey::Members => "members",
            LimitKey::Units => "units",
        };
        f.write_str(name)
    }
}
