use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wareflow_core::{DomainError, DomainResult};

use crate::{UnitId, WarehouseId};

/// Stock transfer identifier, assigned by the data store when the movement is
/// applied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(Uuid);

impl TransferId {
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

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransferId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TransferId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("TransferId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// One line of a stock transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub sku: String,
    pub quantity: u64,
    pub unit_id: Option<UnitId>,
}

/// A requested inter-warehouse stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_warehouse: WarehouseId,
    pub to_warehouse: WarehouseId,
    pub lines: Vec<TransferLine>,
}

impl TransferRequest {
    /// Shape validation only.
    ///
    /// Stock sufficiency is checked by the data store when the movement is
    /// applied; rejecting it here would race against concurrent movements
    /// anyway.
    pub fn validate(&self) -> DomainResult<()> {
        if self.from_warehouse == self.to_warehouse {
            return Err(DomainError::validation(
                "source and destination warehouses must differ",
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("transfer requires at least one line"));
        }
        for line in &self.lines {
            if line.sku.trim().is_empty() {
                return Err(DomainError::validation("transfer line sku cannot be empty"));
            }
            if line.quantity == 0 {
                return Err(DomainError::validation(
                    "transfer line quantity must be positive",
                ));
            }
        }
        Ok(())
    }
}
