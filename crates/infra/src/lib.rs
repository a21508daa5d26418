//! `wareflow-infra` — storage backends and context resolution.
//!
//! Store traits plus two implementations: in-memory (tests/dev) and Postgres
//! (production). Mutations with business rules attached (stock movements,
//! guarded deletes) are forwarded to the data store rather than re-implemented
//! here; the Postgres backend calls SQL functions, the in-memory backend
//! emulates them.

pub mod context;
pub mod entitlements;
pub mod stores;

pub use context::resolve_org_context;
pub use entitlements::InMemoryEntitlementStore;
pub use stores::{
    DirectoryStore, InMemoryDirectoryStore, InMemoryInventoryStore, InventoryStore, StoreError,
};
