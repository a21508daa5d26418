//! In-memory store implementations for tests and development.
//!
//! `apply_transfer` and `delete_unit` emulate the data-store procedures the
//! Postgres backend calls, including their failure modes.

use std::collections::HashMap;
use std::sync::RwLock;

use wareflow_core::{BranchId, OrgId, UserId};
use wareflow_directory::{Branch, OrgMembership, Organization, QrLink, UserPreferences};
use wareflow_entitlements::EntitlementsSnapshot;
use wareflow_inventory::{TransferId, TransferRequest, Unit, UnitId, Warehouse, WarehouseId};

use super::{DirectoryStore, InventoryStore, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    organizations: RwLock<HashMap<OrgId, Organization>>,
    branches: RwLock<HashMap<BranchId, Branch>>,
    memberships: RwLock<Vec<OrgMembership>>,
    preferences: RwLock<HashMap<UserId, UserPreferences>>,
    session_snapshots: RwLock<HashMap<UserId, EntitlementsSnapshot>>,
    qr_links: RwLock<HashMap<String, QrLink>>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DirectoryStore for InMemoryDirectoryStore {
    fn organization(&self, org_id: OrgId) -> Option<Organization> {
        let map = self.organizations.read().ok()?;
        map.get(&org_id).cloned()
    }

    fn upsert_organization(&self, org: Organization) {
        if let Ok(mut map) = self.organizations.write() {
            map.insert(org.id, org);
        }
    }

    fn branch(&self, branch_id: BranchId) -> Option<Branch> {
        let map = self.branches.read().ok()?;
        map.get(&branch_id).cloned()
    }

    fn branches_of(&self, org_id: OrgId) -> Vec<Branch> {
        let map = match self.branches.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut branches: Vec<Branch> = map
            .values()
            .filter(|b| b.org_id == org_id)
            .cloned()
            .collect();
        // Branch ids are UUIDv7, so id order is creation order.
        branches.sort_by_key(|b| *b.id.as_uuid());
        branches
    }

    fn upsert_branch(&self, branch: Branch) {
        if let Ok(mut map) = self.branches.write() {
            map.insert(branch.id, branch);
        }
    }

    fn delete_branch(&self, branch_id: BranchId) {
        if let Ok(mut map) = self.branches.write() {
            map.remove(&branch_id);
        }
    }

    fn memberships_of(&self, user_id: UserId) -> Vec<OrgMembership> {
        let list = match self.memberships.read() {
            Ok(l) => l,
            Err(_) => return vec![],
        };

        list.iter().filter(|m| m.user_id == user_id).cloned().collect()
    }

    fn add_membership(&self, membership: OrgMembership) {
        if let Ok(mut list) = self.memberships.write() {
            let exists = list
                .iter()
                .any(|m| m.org_id == membership.org_id && m.user_id == membership.user_id);
            if !exists {
                list.push(membership);
            }
        }
    }

    fn member_count(&self, org_id: OrgId) -> u64 {
        let list = match self.memberships.read() {
            Ok(l) => l,
            Err(_) => return 0,
        };

        list.iter().filter(|m| m.org_id == org_id).count() as u64
    }

    fn preferences(&self, user_id: UserId) -> Option<UserPreferences> {
        let map = self.preferences.read().ok()?;
        map.get(&user_id).cloned()
    }

    fn upsert_preferences(&self, preferences: UserPreferences) {
        if let Ok(mut map) = self.preferences.write() {
            map.insert(preferences.user_id, preferences);
        }
    }

    fn session_snapshot(&self, user_id: UserId) -> Option<EntitlementsSnapshot> {
        let map = self.session_snapshots.read().ok()?;
        map.get(&user_id).cloned()
    }

    fn set_session_snapshot(&self, user_id: UserId, snapshot: EntitlementsSnapshot) {
        if let Ok(mut map) = self.session_snapshots.write() {
            map.insert(user_id, snapshot);
        }
    }

    fn qr_link(&self, code: &str) -> Option<QrLink> {
        let map = self.qr_links.read().ok()?;
        map.get(code).cloned()
    }

    fn upsert_qr_link(&self, link: QrLink) {
        if let Ok(mut map) = self.qr_links.write() {
            map.insert(link.code.clone(), link);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StockRow {
    quantity: u64,
    unit_id: Option<UnitId>,
}

#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    warehouses: RwLock<HashMap<WarehouseId, Warehouse>>,
    units: RwLock<HashMap<UnitId, Unit>>,
    stock: RwLock<HashMap<(WarehouseId, String), StockRow>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn warehouse(&self, warehouse_id: WarehouseId) -> Option<Warehouse> {
        let map = self.warehouses.read().ok()?;
        map.get(&warehouse_id).cloned()
    }

    fn warehouses_of(&self, org_id: OrgId) -> Vec<Warehouse> {
        let map = match self.warehouses.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut warehouses: Vec<Warehouse> = map
            .values()
            .filter(|w| w.org_id == org_id)
            .cloned()
            .collect();
        warehouses.sort_by_key(|w| *w.id.as_uuid());
        warehouses
    }

    fn upsert_warehouse(&self, warehouse: Warehouse) {
        if let Ok(mut map) = self.warehouses.write() {
            map.insert(warehouse.id, warehouse);
        }
    }

    fn unit(&self, unit_id: UnitId) -> Option<Unit> {
        let map = self.units.read().ok()?;
        map.get(&unit_id).cloned()
    }

    fn units_of(&self, org_id: OrgId) -> Vec<Unit> {
        let map = match self.units.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut units: Vec<Unit> = map.values().filter(|u| u.org_id == org_id).cloned().collect();
        units.sort_by_key(|u| *u.id.as_uuid());
        units
    }

    fn upsert_unit(&self, unit: Unit) {
        if let Ok(mut map) = self.units.write() {
            map.insert(unit.id, unit);
        }
    }

    fn delete_unit(&self, org_id: OrgId, unit_id: UnitId) -> Result<(), StoreError> {
        let mut units = self
            .units
            .write()
            .map_err(|_| StoreError::Backend("units lock poisoned".to_string()))?;

        match units.get(&unit_id) {
            Some(unit) if unit.org_id == org_id => {}
            _ => return Err(StoreError::NotFound),
        }

        let stock = self
            .stock
            .read()
            .map_err(|_| StoreError::Backend("stock lock poisoned".to_string()))?;
        if stock.values().any(|row| row.unit_id == Some(unit_id)) {
            return Err(StoreError::Conflict(
                "unit is still referenced by stock".to_string(),
            ));
        }
        drop(stock);

        units.remove(&unit_id);
        Ok(())
    }

    fn apply_transfer(
        &self,
        org_id: OrgId,
        transfer: &TransferRequest,
    ) -> Result<TransferId, StoreError> {
        let warehouses = self
            .warehouses
            .read()
            .map_err(|_| StoreError::Backend("warehouse lock poisoned".to_string()))?;

        for warehouse_id in [transfer.from_warehouse, transfer.to_warehouse] {
            match warehouses.get(&warehouse_id) {
                Some(w) if w.org_id == org_id => {}
                _ => return Err(StoreError::NotFound),
            }
        }
        drop(warehouses);

        let mut stock = self
            .stock
            .write()
            .map_err(|_| StoreError::Backend("stock lock poisoned".to_string()))?;

        // Validate every line before moving anything: the movement is atomic.
        for line in &transfer.lines {
            let available = stock
                .get(&(transfer.from_warehouse, line.sku.clone()))
                .map(|row| row.quantity)
                .unwrap_or(0);
            if available < line.quantity {
                return Err(StoreError::InsufficientStock {
                    sku: line.sku.clone(),
                    available,
                    requested: line.quantity,
                });
            }
        }

        for line in &transfer.lines {
            let source_key = (transfer.from_warehouse, line.sku.clone());
            let source_unit = {
                let row = stock
                    .get_mut(&source_key)
                    .expect("source row checked above");
                row.quantity -= line.quantity;
                row.unit_id
            };

            let destination = stock
                .entry((transfer.to_warehouse, line.sku.clone()))
                .or_insert(StockRow {
                    quantity: 0,
                    unit_id: line.unit_id.or(source_unit),
                });
            destination.quantity += line.quantity;
        }

        Ok(TransferId::new())
    }

    fn stock_level(&self, warehouse_id: WarehouseId, sku: &str) -> u64 {
        let map = match self.stock.read() {
            Ok(m) => m,
            Err(_) => return 0,
        };

        map.get(&(warehouse_id, sku.to_string()))
            .map(|row| row.quantity)
            .unwrap_or(0)
    }

    fn set_stock_level(
        &self,
        warehouse_id: WarehouseId,
        sku: &str,
        unit_id: Option<UnitId>,
        quantity: u64,
    ) {
        if let Ok(mut map) = self.stock.write() {
            map.insert(
                (warehouse_id, sku.to_string()),
                StockRow { quantity, unit_id },
            );
        }
    }
}
