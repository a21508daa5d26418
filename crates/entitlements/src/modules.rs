use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Slug of a feature module a plan can enable (e.g. "transfers").
///
/// Opaque string at this layer, mirroring the role model: the set of modules
/// is plan configuration, not code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleSlug(Cow<'static, str>);

impl ModuleSlug {
    pub fn new(slug: impl Into<Cow<'static, str>>) -> Self {
        Self(slug.into())
    }

    pub const fn from_static(slug: &'static str) -> Self {
        Self(Cow::Borrowed(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ModuleSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Module slugs with built-in meaning to the application.
pub mod well_known {
    use super::ModuleSlug;

    /// Inter-warehouse stock transfers.
    pub const TRANSFERS: ModuleSlug = ModuleSlug::from_static("transfers");

    /// Warehouse management beyond the default warehouse.
    pub const WAREHOUSES: ModuleSlug = ModuleSlug::from_static("warehouses");

    /// Reporting and exports.
    pub const REPORTS: ModuleSlug = ModuleSlug::from_static("reports");
}
