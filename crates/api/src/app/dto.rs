use serde::Deserialize;

use wareflow_core::{BranchId, OrgId};
use wareflow_inventory::{TransferLine, UnitId, WarehouseId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct UpdateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchOrganizationRequest {
    pub org_id: OrgId,
}

#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchBranchRequest {
    pub branch_id: BranchId,
}

#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    pub branch_id: BranchId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUnitRequest {
    pub name: String,
    pub abbreviation: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferLineRequest {
    pub sku: String,
    pub quantity: u64,
    pub unit_id: Option<UnitId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub from_warehouse: WarehouseId,
    pub to_warehouse: WarehouseId,
    pub lines: Vec<TransferLineRequest>,
}

impl From<TransferLineRequest> for TransferLine {
    fn from(value: TransferLineRequest) -> Self {
        TransferLine {
            sku: value.sku,
            quantity: value.quantity,
            unit_id: value.unit_id,
        }
    }
}
