//! Store traits over the external data store.
//!
//! The application treats its backing store as an opaque query/RPC interface:
//! row-level security, serialization of concurrent writes, and the business
//! rules baked into store procedures are the store's concern, not ours.

use std::sync::Arc;

use thiserror::Error;

use wareflow_core::{BranchId, OrgId, UserId};
use wareflow_directory::{Branch, OrgMembership, Organization, QrLink, UserPreferences};
use wareflow_entitlements::EntitlementsSnapshot;
use wareflow_inventory::{TransferId, TransferRequest, Unit, UnitId, Warehouse, WarehouseId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryDirectoryStore, InMemoryInventoryStore};
pub use postgres::{PostgresDirectoryStore, PostgresEntitlementSource, PostgresInventoryStore};

/// Data store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("insufficient stock of '{sku}' in source warehouse ({available} < {requested})")]
    InsufficientStock {
        sku: String,
        available: u64,
        requested: u64,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("data store failure: {0}")]
    Backend(String),
}

/// Organization directory: orgs, branches, memberships, preferences, QR links.
///
/// Reads return `Option`/`Vec` (absence is not an error at this layer);
/// mutations are upsert-shaped the way the backing store's API is.
pub trait DirectoryStore: Send + Sync {
    fn organization(&self, org_id: OrgId) -> Option<Organization>;
    fn upsert_organization(&self, org: Organization);

    fn branch(&self, branch_id: BranchId) -> Option<Branch>;
    /// Branches of an organization, oldest first.
    fn branches_of(&self, org_id: OrgId) -> Vec<Branch>;
    fn upsert_branch(&self, branch: Branch);
    fn delete_branch(&self, branch_id: BranchId);

    /// Memberships of a user, oldest first.
    fn memberships_of(&self, user_id: UserId) -> Vec<OrgMembership>;
    fn add_membership(&self, membership: OrgMembership);
    fn member_count(&self, org_id: OrgId) -> u64;

    fn preferences(&self, user_id: UserId) -> Option<UserPreferences>;
    fn upsert_preferences(&self, preferences: UserPreferences);

    /// The entitlements snapshot cached on the user's session, if any.
    ///
    /// May lag behind reality (e.g. after an organization switch); the
    /// entitlement gate validates its organization id before trusting it.
    fn session_snapshot(&self, user_id: UserId) -> Option<EntitlementsSnapshot>;
    fn set_session_snapshot(&self, user_id: UserId, snapshot: EntitlementsSnapshot);

    fn qr_link(&self, code: &str) -> Option<QrLink>;
    fn upsert_qr_link(&self, link: QrLink);
}

/// Warehouses, units of measure, stock, and transfers.
pub trait InventoryStore: Send + Sync {
    fn warehouse(&self, warehouse_id: WarehouseId) -> Option<Warehouse>;
    fn warehouses_of(&self, org_id: OrgId) -> Vec<Warehouse>;
    fn upsert_warehouse(&self, warehouse: Warehouse);

    fn unit(&self, unit_id: UnitId) -> Option<Unit>;
    fn units_of(&self, org_id: OrgId) -> Vec<Unit>;
    fn upsert_unit(&self, unit: Unit);

    /// Delete a unit. Refused while any stock row still references it.
    fn delete_unit(&self, org_id: OrgId, unit_id: UnitId) -> Result<(), StoreError>;

    /// Apply a stock movement between two warehouses of `org_id`.
    ///
    /// Stock validation and the movement itself live in the data store; this
    /// call is a pass-through and either fully applies or fully fails.
    fn apply_transfer(
        &self,
        org_id: OrgId,
        transfer: &TransferRequest,
    ) -> Result<TransferId, StoreError>;

    fn stock_level(&self, warehouse_id: WarehouseId, sku: &str) -> u64;
    fn set_stock_level(
        &self,
        warehouse_id: WarehouseId,
        sku: &str,
        unit_id: Option<UnitId>,
        quantity: u64,
    );
}

impl<S> DirectoryStore for Arc<S>
where
    S: DirectoryStore + ?Sized,
{
    fn organization(&self, org_id: OrgId) -> Option<Organization> {
        (**self).organization(org_id)
    }

    fn upsert_organization(&self, org: Organization) {
        (**self).upsert_organization(org)
    }

    fn branch(&self, branch_id: BranchId) -> Option<Branch> {
        (**self).branch(branch_id)
    }

    fn branches_of(&self, org_id: OrgId) -> Vec<Branch> {
        (**self).branches_of(org_id)
    }

    fn upsert_branch(&self, branch: Branch) {
        (**self).upsert_branch(branch)
    }

    fn delete_branch(&self, branch_id: BranchId) {
        (**self).delete_branch(branch_id)
    }

    fn memberships_of(&self, user_id: UserId) -> Vec<OrgMembership> {
        (**self).memberships_of(user_id)
    }

    fn add_membership(&self, membership: OrgMembership) {
        (**self).add_membership(membership)
    }

    fn member_count(&self, org_id: OrgId) -> u64 {
        (**self).member_count(org_id)
    }

    fn preferences(&self, user_id: UserId) -> Option<UserPreferences> {
        (**self).preferences(user_id)
    }

    fn upsert_preferences(&self, preferences: UserPreferences) {
        (**self).upsert_preferences(preferences)
    }

    fn session_snapshot(&self, user_id: UserId) -> Option<EntitlementsSnapshot> {
        (**self).session_snapshot(user_id)
    }

    fn set_session_snapshot(&self, user_id: UserId, snapshot: EntitlementsSnapshot) {
        (**self).set_session_snapshot(user_id, snapshot)
    }

    fn qr_link(&self, code: &str) -> Option<QrLink> {
        (**self).qr_link(code)
    }

    fn upsert_qr_link(&self, link: QrLink) {
        (**self).upsert_qr_link(link)
    }
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn warehouse(&self, warehouse_id: WarehouseId) -> Option<Warehouse> {
        (**self).warehouse(warehouse_id)
    }

    fn warehouses_of(&self, org_id: OrgId) -> Vec<Warehouse> {
        (**self).warehouses_of(org_id)
    }

    fn upsert_warehouse(&self, warehouse: Warehouse) {
        (**self).upsert_warehouse(warehouse)
    }

    fn unit(&self, unit_id: UnitId) -> Option<Unit> {
        (**self).unit(unit_id)
    }

    fn units_of(&self, org_id: OrgId) -> Vec<Unit> {
        (**self).units_of(org_id)
    }

    fn upsert_unit(&self, unit: Unit) {
        (**self).upsert_unit(unit)
    }

    fn delete_unit(&self, org_id: OrgId, unit_id: UnitId) -> Result<(), StoreError> {
        (**self).delete_unit(org_id, unit_id)
    }

    fn apply_transfer(
        &self,
        org_id: OrgId,
        transfer: &TransferRequest,
    ) -> Result<TransferId, StoreError> {
        (**self).apply_transfer(org_id, transfer)
    }

    fn stock_level(&self, warehouse_id: WarehouseId, sku: &str) -> u64 {
        (**self).stock_level(warehouse_id, sku)
    }

    fn set_stock_level(
        &self,
        warehouse_id: WarehouseId,
        sku: &str,
        unit_id: Option<UnitId>,
        quantity: u64,
    ) {
        (**self).set_stock_level(warehouse_id, sku, unit_id, quantity)
    }
}
