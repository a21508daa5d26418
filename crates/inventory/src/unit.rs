use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wareflow_core::{DomainError, OrgId};

/// Unit-of-measure identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(Uuid);

impl UnitId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for UnitId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UnitId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("UnitId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// A unit of measure (e.g. "piece", "kg"), organization-scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub org_id: OrgId,
    pub name: String,
    pub abbreviation: String,
}

impl Unit {
    /// Validate a unit before persisting it.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("unit name cannot be empty"));
        }
        if self.abbreviation.trim().is_empty() {
            return Err(DomainError::validation("unit abbreviation cannot be empty"));
        }
        Ok(())
    }
}
