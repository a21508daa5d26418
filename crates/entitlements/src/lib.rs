//! `wareflow-entitlements` — plan entitlements and the entitlement gate.
//!
//! An organization's subscription plan grants a set of enabled modules and
//! numeric limits; the gate checks both against an authoritative snapshot
//! source before any guarded mutation runs.

pub mod gate;
pub mod limits;
pub mod modules;
pub mod snapshot;

pub use gate::{EntitlementError, EntitlementSource, require_module_access, require_within_limit};
pub use limits::LimitKey;
pub use modules::{ModuleSlug, well_known};
pub use snapshot::EntitlementsSnapshot;
