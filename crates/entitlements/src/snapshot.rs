use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use wareflow_core::OrgId;

use crate::{LimitKey, ModuleSlug};

/// Read-only view of what an organization's plan grants.
///
/// Owned by the organization; the application never mutates it, only
/// refreshes it from the data store. A snapshot is trusted only when its
/// `organization_id` matches the organization being authorized (see
/// [`crate::gate`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementsSnapshot {
    pub organization_id: OrgId,

    #[serde(default)]
    pub enabled_modules: Vec<ModuleSlug>,

    #[serde(default)]
    pub limits: HashMap<LimitKey, u64>,
}

impl EntitlementsSnapshot {
    pub fn new(organization_id: OrgId) -> Self {
        Self {
            organization_id,
            enabled_modules: Vec::new(),
            limits: HashMap::new(),
        }
    }

    pub fn with_module(mut self, module: ModuleSlug) -> Self {
        self.enabled_modules.push(module);
        self
    }

    pub fn with_limit(mut self, key: LimitKey, max: u64) -> Self {
        self.limits.insert(key, max);
        self
    }

    pub fn module_enabled(&self, module: &ModuleSlug) -> bool {
        self.enabled_modules.contains(module)
    }

    /// The configured maximum for `key`, if the plan names one.
    pub fn limit(&self, key: LimitKey) -> Option<u64> {
        self.limits.get(&key).copied()
    }
}
