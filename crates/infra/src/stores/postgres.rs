//! Postgres-backed store implementations.
//!
//! Reads are plain queries; mutations with business rules attached go through
//! SQL functions (`apply_stock_transfer`, `delete_unit`) so that stock
//! validation and referential checks run inside the data store, next to the
//! data, under its row-level security.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use wareflow_core::{BranchId, OrgId, UserId};
use wareflow_directory::{Branch, OrgMembership, Organization, QrLink, UserPreferences};
use wareflow_entitlements::{
    EntitlementError, EntitlementSource, EntitlementsSnapshot, LimitKey, ModuleSlug,
};
use wareflow_inventory::{TransferId, TransferRequest, Unit, UnitId, Warehouse, WarehouseId};

use super::{DirectoryStore, InventoryStore, StoreError};

fn runtime_handle() -> Result<tokio::runtime::Handle, StoreError> {
    tokio::runtime::Handle::try_current()
        .map_err(|e| StoreError::Backend(format!("no tokio runtime: {e}")))
}

fn map_sql_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) => {
            // Store procedures signal business failures via RAISE EXCEPTION.
            let message = db.message().to_string();
            if message.contains("insufficient stock") || message.contains("still referenced") {
                StoreError::Conflict(message)
            } else {
                StoreError::Backend(message)
            }
        }
        other => StoreError::Backend(other.to_string()),
    }
}

/// Postgres-backed [`DirectoryStore`].
pub struct PostgresDirectoryStore {
    pool: Arc<PgPool>,
}

impl PostgresDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn run<F, T>(&self, future: F) -> Option<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        match handle.block_on(future) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(error = %err, "directory query failed");
                None
            }
        }
    }
}

fn organization_from_row(row: &PgRow) -> Option<Organization> {
    Some(Organization {
        id: OrgId::from_uuid(row.try_get("id").ok()?),
        name: row.try_get("name").ok()?,
        created_at: row.try_get("created_at").ok()?,
    })
}

fn branch_from_row(row: &PgRow) -> Option<Branch> {
    Some(Branch {
        id: BranchId::from_uuid(row.try_get("id").ok()?),
        org_id: OrgId::from_uuid(row.try_get("org_id").ok()?),
        name: row.try_get("name").ok()?,
        created_at: row.try_get("created_at").ok()?,
    })
}

impl DirectoryStore for PostgresDirectoryStore {
    fn organization(&self, org_id: OrgId) -> Option<Organization> {
        let pool = self.pool.clone();
        let row = self.run(async move {
            sqlx::query("SELECT id, name, created_at FROM organizations WHERE id = $1")
                .bind(*org_id.as_uuid())
                .fetch_optional(&*pool)
                .await
        })??;
        organization_from_row(&row)
    }

    fn upsert_organization(&self, org: Organization) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO organizations (id, name, created_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
            )
            .bind(*org.id.as_uuid())
            .bind(org.name)
            .bind(org.created_at)
            .execute(&*pool)
            .await
        });
    }

    fn branch(&self, branch_id: BranchId) -> Option<Branch> {
        let pool = self.pool.clone();
        let row = self.run(async move {
            sqlx::query("SELECT id, org_id, name, created_at FROM branches WHERE id = $1")
                .bind(*branch_id.as_uuid())
                .fetch_optional(&*pool)
                .await
        })??;
        branch_from_row(&row)
    }

    fn branches_of(&self, org_id: OrgId) -> Vec<Branch> {
        let pool = self.pool.clone();
        let rows = self
            .run(async move {
                sqlx::query(
                    "SELECT id, org_id, name, created_at FROM branches WHERE org_id = $1 ORDER BY id",
                )
                .bind(*org_id.as_uuid())
                .fetch_all(&*pool)
                .await
            })
            .unwrap_or_default();

        rows.iter().filter_map(branch_from_row).collect()
    }

    fn upsert_branch(&self, branch: Branch) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO branches (id, org_id, name, created_at) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
            )
            .bind(*branch.id.as_uuid())
            .bind(*branch.org_id.as_uuid())
            .bind(branch.name)
            .bind(branch.created_at)
            .execute(&*pool)
            .await
        });
    }

    fn delete_branch(&self, branch_id: BranchId) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query("DELETE FROM branches WHERE id = $1")
                .bind(*branch_id.as_uuid())
                .execute(&*pool)
                .await
        });
    }

    fn memberships_of(&self, user_id: UserId) -> Vec<OrgMembership> {
        let pool = self.pool.clone();
        let rows = self
            .run(async move {
                sqlx::query(
                    "SELECT org_id, user_id, joined_at FROM org_memberships \
                     WHERE user_id = $1 ORDER BY joined_at",
                )
                .bind(*user_id.as_uuid())
                .fetch_all(&*pool)
                .await
            })
            .unwrap_or_default();

        rows.iter()
            .filter_map(|row| {
                Some(OrgMembership {
                    org_id: OrgId::from_uuid(row.try_get("org_id").ok()?),
                    user_id: UserId::from_uuid(row.try_get("user_id").ok()?),
                    joined_at: row.try_get("joined_at").ok()?,
                })
            })
            .collect()
    }

    fn add_membership(&self, membership: OrgMembership) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO org_memberships (org_id, user_id, joined_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (org_id, user_id) DO NOTHING",
            )
            .bind(*membership.org_id.as_uuid())
            .bind(*membership.user_id.as_uuid())
            .bind(membership.joined_at)
            .execute(&*pool)
            .await
        });
    }

    fn member_count(&self, org_id: OrgId) -> u64 {
        let pool = self.pool.clone();
        let count = self
            .run(async move {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM org_memberships WHERE org_id = $1",
                )
                .bind(*org_id.as_uuid())
                .fetch_one(&*pool)
                .await
            })
            .unwrap_or(0);
        count.max(0) as u64
    }

    fn preferences(&self, user_id: UserId) -> Option<UserPreferences> {
        let pool = self.pool.clone();
        let row = self.run(async move {
            sqlx::query(
                "SELECT user_id, active_org_id, active_branch_id FROM user_preferences \
                 WHERE user_id = $1",
            )
            .bind(*user_id.as_uuid())
            .fetch_optional(&*pool)
            .await
        })??;

        Some(UserPreferences {
            user_id: UserId::from_uuid(row.try_get("user_id").ok()?),
            active_org_id: row
                .try_get::<Option<Uuid>, _>("active_org_id")
                .ok()?
                .map(OrgId::from_uuid),
            active_branch_id: row
                .try_get::<Option<Uuid>, _>("active_branch_id")
                .ok()?
                .map(BranchId::from_uuid),
        })
    }

    fn upsert_preferences(&self, preferences: UserPreferences) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO user_preferences (user_id, active_org_id, active_branch_id) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                 active_org_id = EXCLUDED.active_org_id, \
                 active_branch_id = EXCLUDED.active_branch_id",
            )
            .bind(*preferences.user_id.as_uuid())
            .bind(preferences.active_org_id.map(|id| *id.as_uuid()))
            .bind(preferences.active_branch_id.map(|id| *id.as_uuid()))
            .execute(&*pool)
            .await
        });
    }

    fn session_snapshot(&self, user_id: UserId) -> Option<EntitlementsSnapshot> {
        let pool = self.pool.clone();
        let payload = self.run(async move {
            sqlx::query_scalar::<_, serde_json::Value>(
                "SELECT payload FROM session_entitlements WHERE user_id = $1",
            )
            .bind(*user_id.as_uuid())
            .fetch_optional(&*pool)
            .await
        })??;

        serde_json::from_value(payload).ok()
    }

    fn set_session_snapshot(&self, user_id: UserId, snapshot: EntitlementsSnapshot) {
        let payload = match serde_json::to_value(&snapshot) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize session snapshot");
                return;
            }
        };

        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO session_entitlements (user_id, payload) VALUES ($1, $2) \
                 ON CONFLICT (user_id) DO UPDATE SET payload = EXCLUDED.payload",
            )
            .bind(*user_id.as_uuid())
            .bind(payload)
            .execute(&*pool)
            .await
        });
    }

    fn qr_link(&self, code: &str) -> Option<QrLink> {
        let pool = self.pool.clone();
        let code = code.to_string();
        let row = self.run(async move {
            sqlx::query("SELECT code, org_id, target_path FROM qr_links WHERE code = $1")
                .bind(code)
                .fetch_optional(&*pool)
                .await
        })??;

        Some(QrLink {
            code: row.try_get("code").ok()?,
            org_id: OrgId::from_uuid(row.try_get("org_id").ok()?),
            target_path: row.try_get("target_path").ok()?,
        })
    }

    fn upsert_qr_link(&self, link: QrLink) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO qr_links (code, org_id, target_path) VALUES ($1, $2, $3) \
                 ON CONFLICT (code) DO UPDATE SET target_path = EXCLUDED.target_path",
            )
            .bind(link.code)
            .bind(*link.org_id.as_uuid())
            .bind(link.target_path)
            .execute(&*pool)
            .await
        });
    }
}

/// Postgres-backed [`InventoryStore`].
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn run<F, T>(&self, future: F) -> Option<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        match handle.block_on(future) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::error!(error = %err, "inventory query failed");
                None
            }
        }
    }
}

fn warehouse_from_row(row: &PgRow) -> Option<Warehouse> {
    Some(Warehouse {
        id: WarehouseId::from_uuid(row.try_get("id").ok()?),
        org_id: OrgId::from_uuid(row.try_get("org_id").ok()?),
        branch_id: BranchId::from_uuid(row.try_get("branch_id").ok()?),
        name: row.try_get("name").ok()?,
        created_at: row.try_get("created_at").ok()?,
    })
}

fn unit_from_row(row: &PgRow) -> Option<Unit> {
    Some(Unit {
        id: UnitId::from_uuid(row.try_get("id").ok()?),
        org_id: OrgId::from_uuid(row.try_get("org_id").ok()?),
        name: row.try_get("name").ok()?,
        abbreviation: row.try_get("abbreviation").ok()?,
    })
}

impl InventoryStore for PostgresInventoryStore {
    fn warehouse(&self, warehouse_id: WarehouseId) -> Option<Warehouse> {
        let pool = self.pool.clone();
        let row = self.run(async move {
            sqlx::query(
                "SELECT id, org_id, branch_id, name, created_at FROM warehouses WHERE id = $1",
            )
            .bind(*warehouse_id.as_uuid())
            .fetch_optional(&*pool)
            .await
        })??;
        warehouse_from_row(&row)
    }

    fn warehouses_of(&self, org_id: OrgId) -> Vec<Warehouse> {
        let pool = self.pool.clone();
        let rows = self
            .run(async move {
                sqlx::query(
                    "SELECT id, org_id, branch_id, name, created_at FROM warehouses \
                     WHERE org_id = $1 ORDER BY id",
                )
                .bind(*org_id.as_uuid())
                .fetch_all(&*pool)
                .await
            })
            .unwrap_or_default();

        rows.iter().filter_map(warehouse_from_row).collect()
    }

    fn upsert_warehouse(&self, warehouse: Warehouse) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO warehouses (id, org_id, branch_id, name, created_at) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name",
            )
            .bind(*warehouse.id.as_uuid())
            .bind(*warehouse.org_id.as_uuid())
            .bind(*warehouse.branch_id.as_uuid())
            .bind(warehouse.name)
            .bind(warehouse.created_at)
            .execute(&*pool)
            .await
        });
    }

    fn unit(&self, unit_id: UnitId) -> Option<Unit> {
        let pool = self.pool.clone();
        let row = self.run(async move {
            sqlx::query("SELECT id, org_id, name, abbreviation FROM units WHERE id = $1")
                .bind(*unit_id.as_uuid())
                .fetch_optional(&*pool)
                .await
        })??;
        unit_from_row(&row)
    }

    fn units_of(&self, org_id: OrgId) -> Vec<Unit> {
        let pool = self.pool.clone();
        let rows = self
            .run(async move {
                sqlx::query(
                    "SELECT id, org_id, name, abbreviation FROM units WHERE org_id = $1 ORDER BY id",
                )
                .bind(*org_id.as_uuid())
                .fetch_all(&*pool)
                .await
            })
            .unwrap_or_default();

        rows.iter().filter_map(unit_from_row).collect()
    }

    fn upsert_unit(&self, unit: Unit) {
        let pool = self.pool.clone();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO units (id, org_id, name, abbreviation) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, abbreviation = EXCLUDED.abbreviation",
            )
            .bind(*unit.id.as_uuid())
            .bind(*unit.org_id.as_uuid())
            .bind(unit.name)
            .bind(unit.abbreviation)
            .execute(&*pool)
            .await
        });
    }

    fn delete_unit(&self, org_id: OrgId, unit_id: UnitId) -> Result<(), StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();

        // delete_unit() refuses inside the store while stock references the
        // unit, and returns false when the unit does not exist.
        let deleted = handle
            .block_on(async move {
                sqlx::query_scalar::<_, bool>("SELECT delete_unit($1, $2)")
                    .bind(*org_id.as_uuid())
                    .bind(*unit_id.as_uuid())
                    .fetch_one(&*pool)
                    .await
            })
            .map_err(map_sql_error)?;

        if deleted { Ok(()) } else { Err(StoreError::NotFound) }
    }

    fn apply_transfer(
        &self,
        org_id: OrgId,
        transfer: &TransferRequest,
    ) -> Result<TransferId, StoreError> {
        let handle = runtime_handle()?;
        let pool = self.pool.clone();
        let lines = serde_json::to_value(&transfer.lines)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let applied = handle
            .block_on(async move {
                sqlx::query_scalar::<_, Uuid>("SELECT apply_stock_transfer($1, $2, $3, $4)")
                    .bind(*org_id.as_uuid())
                    .bind(*transfer.from_warehouse.as_uuid())
                    .bind(*transfer.to_warehouse.as_uuid())
                    .bind(lines)
                    .fetch_one(&*pool)
                    .await
            })
            .map_err(map_sql_error)?;

        Ok(TransferId::from_uuid(applied))
    }

    fn stock_level(&self, warehouse_id: WarehouseId, sku: &str) -> u64 {
        let pool = self.pool.clone();
        let sku = sku.to_string();
        let quantity = self
            .run(async move {
                sqlx::query_scalar::<_, Option<i64>>(
                    "SELECT quantity FROM stock_levels WHERE warehouse_id = $1 AND sku = $2",
                )
                .bind(*warehouse_id.as_uuid())
                .bind(sku)
                .fetch_optional(&*pool)
                .await
            })
            .flatten()
            .flatten()
            .unwrap_or(0);
        quantity.max(0) as u64
    }

    fn set_stock_level(
        &self,
        warehouse_id: WarehouseId,
        sku: &str,
        unit_id: Option<UnitId>,
        quantity: u64,
    ) {
        let pool = self.pool.clone();
        let sku = sku.to_string();
        let _ = self.run(async move {
            sqlx::query(
                "INSERT INTO stock_levels (warehouse_id, sku, unit_id, quantity) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (warehouse_id, sku) DO UPDATE SET \
                 unit_id = EXCLUDED.unit_id, quantity = EXCLUDED.quantity",
            )
            .bind(*warehouse_id.as_uuid())
            .bind(sku)
            .bind(unit_id.map(|id| *id.as_uuid()))
            .bind(quantity as i64)
            .execute(&*pool)
            .await
        });
    }
}

/// Postgres-backed [`EntitlementSource`].
pub struct PostgresEntitlementSource {
    pool: Arc<PgPool>,
}

impl PostgresEntitlementSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl EntitlementSource for PostgresEntitlementSource {
    fn load_snapshot(&self, org_id: OrgId) -> Result<EntitlementsSnapshot, EntitlementError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| EntitlementError::Source(format!("no tokio runtime: {e}")))?;
        let pool = self.pool.clone();

        let row = handle
            .block_on(async move {
                sqlx::query(
                    "SELECT enabled_modules, limits FROM org_entitlements \
                     WHERE organization_id = $1",
                )
                .bind(*org_id.as_uuid())
                .fetch_optional(&*pool)
                .await
            })
            .map_err(|e| EntitlementError::Source(e.to_string()))?
            .ok_or(EntitlementError::MissingSnapshot(org_id))?;

        let enabled_modules: Vec<ModuleSlug> = row
            .try_get::<serde_json::Value, _>("enabled_modules")
            .ok()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        let limits: HashMap<LimitKey, u64> = row
            .try_get::<serde_json::Value, _>("limits")
            .ok()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        Ok(EntitlementsSnapshot {
            organization_id: org_id,
            enabled_modules,
            limits,
        })
    }

    fn usage(&self, org_id: OrgId, key: LimitKey) -> Result<u64, EntitlementError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| EntitlementError::Source(format!("no tokio runtime: {e}")))?;
        let pool = self.pool.clone();

        let sql = match key {
            LimitKey::Branches => "SELECT COUNT(*) FROM branches WHERE org_id = $1",
            LimitKey::Members => "SELECT COUNT(*) FROM org_memberships WHERE org_id = $1",
            LimitKey::Warehouses => "SELECT COUNT(*) FROM warehouses WHERE org_id = $1",
            LimitKey::Units => "SELECT COUNT(*) FROM units WHERE org_id = $1",
        };

        let count = handle
            .block_on(async move {
                sqlx::query_scalar::<_, i64>(sql)
                    .bind(*org_id.as_uuid())
                    .fetch_one(&*pool)
                    .await
            })
            .map_err(|e| EntitlementError::Source(e.to_string()))?;

        Ok(count.max(0) as u64)
    }
}
