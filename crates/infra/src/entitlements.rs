//! Store-backed entitlement source.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use wareflow_core::OrgId;
use wareflow_entitlements::{EntitlementError, EntitlementSource, EntitlementsSnapshot, LimitKey};

use crate::stores::{DirectoryStore, InMemoryDirectoryStore, InMemoryInventoryStore, InventoryStore};

/// In-memory [`EntitlementSource`]: plan snapshots held in a map, live usage
/// counted off the in-memory stores.
#[derive(Debug)]
pub struct InMemoryEntitlementStore {
    snapshots: RwLock<HashMap<OrgId, EntitlementsSnapshot>>,
    directory: Arc<InMemoryDirectoryStore>,
    inventory: Arc<InMemoryInventoryStore>,
}

impl InMemoryEntitlementStore {
    pub fn new(
        directory: Arc<InMemoryDirectoryStore>,
        inventory: Arc<InMemoryInventoryStore>,
    ) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            directory,
            inventory,
        }
    }

    /// Install or replace the authoritative snapshot for an organization.
    pub fn set_snapshot(&self, snapshot: EntitlementsSnapshot) {
        if let Ok(mut map) = self.snapshots.write() {
            map.insert(snapshot.organization_id, snapshot);
        }
    }
}

impl EntitlementSource for InMemoryEntitlementStore {
    fn load_snapshot(&self, org_id: OrgId) -> Result<EntitlementsSnapshot, EntitlementError> {
        let map = self
            .snapshots
            .read()
            .map_err(|_| EntitlementError::Source("snapshot lock poisoned".to_string()))?;

        map.get(&org_id)
            .cloned()
            .ok_or(EntitlementError::MissingSnapshot(org_id))
    }

    fn usage(&self, org_id: OrgId, key: LimitKey) -> Result<u64, EntitlementError> {
        let count = match key {
            LimitKey::Branches => self.directory.branches_of(org_id).len() as u64,
            LimitKey::Members => self.directory.member_count(org_id),
            LimitKey::Warehouses => self.inventory.warehouses_of(org_id).len() as u64,
            LimitKey::Units => self.inventory.units_of(org_id).len() as u64,
        };
        Ok(count)
    }
}
