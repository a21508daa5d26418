//! Entitlement gate: module and limit checks against an authoritative
//! snapshot source.
//!
//! Callers may offer a cached snapshot (typically the one attached to the
//! resolved organization context). The gate trusts it only when its embedded
//! organization id matches the organization being authorized; otherwise the
//! snapshot is discarded and a fresh one is loaded from the source.

use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use wareflow_core::OrgId;

use crate::{EntitlementsSnapshot, LimitKey, ModuleSlug};

/// Entitlement gate failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("module '{0}' is not enabled for this organization")]
    ModuleDisabled(ModuleSlug),

    #[error("limit '{key}' reached ({current}/{max})")]
    LimitExceeded { key: LimitKey, current: u64, max: u64 },

    #[error("no entitlements configured for organization {0}")]
    MissingSnapshot(OrgId),

    #[error("entitlement source failure: {0}")]
    Source(String),
}

/// Authoritative source of entitlement snapshots and live usage counts.
///
/// Implementations query the external data store. No caching happens at this
/// level; callers decide which cached snapshot (if any) to offer the gate.
pub trait EntitlementSource: Send + Sync {
    fn load_snapshot(&self, org_id: OrgId) -> Result<EntitlementsSnapshot, EntitlementError>;

    /// Live count of the resource governed by `key` (e.g. current branches).
    fn usage(&self, org_id: OrgId, key: LimitKey) -> Result<u64, EntitlementError>;
}

impl<S> EntitlementSource for Arc<S>
where
    S: EntitlementSource + ?Sized,
{
    fn load_snapshot(&self, org_id: OrgId) -> Result<EntitlementsSnapshot, EntitlementError> {
        (**self).load_snapshot(org_id)
    }

    fn usage(&self, org_id: OrgId, key: LimitKey) -> Result<u64, EntitlementError> {
        (**self).usage(org_id, key)
    }
}

/// Resolve the snapshot the gate is allowed to trust.
fn authoritative_snapshot<'a, S>(
    source: &S,
    org_id: OrgId,
    cached: Option<&'a EntitlementsSnapshot>,
) -> Result<Cow<'a, EntitlementsSnapshot>, EntitlementError>
where
    S: EntitlementSource + ?Sized,
{
    match cached {
        Some(snapshot) if snapshot.organization_id == org_id => Ok(Cow::Borrowed(snapshot)),
        Some(snapshot) => {
            tracing::warn!(
                cached_org = %snapshot.organization_id,
                active_org = %org_id,
                "cached entitlements snapshot belongs to a different organization; reloading"
            );
            source.load_snapshot(org_id).map(Cow::Owned)
        }
        None => source.load_snapshot(org_id).map(Cow::Owned),
    }
}

/// Deny unless `module` is enabled for the organization.
pub fn require_module_access<S>(
    source: &S,
    org_id: OrgId,
    cached: Option<&EntitlementsSnapshot>,
    module: &ModuleSlug,
) -> Result<(), EntitlementError>
where
    S: EntitlementSource + ?Sized,
{
    let snapshot = authoritative_snapshot(source, org_id, cached)?;
    if snapshot.module_enabled(module) {
        Ok(())
    } else {
        Err(EntitlementError::ModuleDisabled(module.clone()))
    }
}

/// Deny unless the live usage for `key` is strictly below the configured
/// maximum.
///
/// A key the plan does not name counts as a maximum of zero: an
/// unconfigured limit denies rather than silently allowing unbounded use.
pub fn require_within_limit<S>(
    source: &S,
    org_id: OrgId,
    cached: Option<&EntitlementsSnapshot>,
    key: LimitKey,
) -> Result<(), EntitlementError>
where
    S: EntitlementSource + ?Sized,
{
    let snapshot = authoritative_snapshot(source, org_id, cached)?;
    let max = snapshot.limit(key).unwrap_or(0);
    let current = source.usage(org_id, key)?;

    if current >= max {
        return Err(EntitlementError::LimitExceeded { key, current, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::modules::well_known;

    /// Source that serves one snapshot and counts how often it is asked.
    struct CountingSource {
        snapshot: EntitlementsSnapshot,
        usage: u64,
        loads: AtomicUsize,
    }

    impl CountingSource {
        fn new(snapshot: EntitlementsSnapshot, usage: u64) -> Self {
            Self {
                snapshot,
                usage,
                loads: AtomicUsize::new(0),
            }
        }

        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl EntitlementSource for CountingSource {
        fn load_snapshot(&self, org_id: OrgId) -> Result<EntitlementsSnapshot, EntitlementError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.snapshot.organization_id == org_id {
                Ok(self.snapshot.clone())
            } else {
                Err(EntitlementError::MissingSnapshot(org_id))
            }
        }

        fn usage(&self, _org_id: OrgId, _key: LimitKey) -> Result<u64, EntitlementError> {
            Ok(self.usage)
        }
    }

    #[test]
    fn matching_cached_snapshot_avoids_a_source_load() {
        let org_id = OrgId::new();
        let snapshot = EntitlementsSnapshot::new(org_id).with_module(well_known::TRANSFERS);
        let source = CountingSource::new(snapshot.clone(), 0);

        assert_eq!(
            require_module_access(&source, org_id, Some(&snapshot), &well_known::TRANSFERS),
            Ok(())
        );
        assert_eq!(source.loads(), 0);
    }

    #[test]
    fn mismatched_cached_snapshot_is_discarded_and_reloaded() {
        let active_org = OrgId::new();
        let other_org = OrgId::new();

        // The stale cache claims the module is enabled, but it belongs to a
        // different organization. The authoritative snapshot does not enable
        // the module, so the check must deny.
        let stale = EntitlementsSnapshot::new(other_org).with_module(well_known::TRANSFERS);
        let authoritative = EntitlementsSnapshot::new(active_org);
        let source = CountingSource::new(authoritative, 0);

        let result = require_module_access(&source, active_org, Some(&stale), &well_known::TRANSFERS);
        assert_eq!(
            result,
            Err(EntitlementError::ModuleDisabled(well_known::TRANSFERS))
        );
        assert_eq!(source.loads(), 1);
    }

    #[test]
    fn module_access_denied_when_absent() {
        let org_id = OrgId::new();
        let snapshot = EntitlementsSnapshot::new(org_id).with_module(well_known::REPORTS);
        let source = CountingSource::new(snapshot.clone(), 0);

        assert_eq!(
            require_module_access(&source, org_id, Some(&snapshot), &well_known::TRANSFERS),
            Err(EntitlementError::ModuleDisabled(well_known::TRANSFERS))
        );
    }

    #[test]
    fn usage_below_limit_is_allowed() {
        let org_id = OrgId::new();
        let snapshot = EntitlementsSnapshot::new(org_id).with_limit(LimitKey::Branches, 3);
        let source = CountingSource::new(snapshot.clone(), 2);

        assert_eq!(
            require_within_limit(&source, org_id, Some(&snapshot), LimitKey::Branches),
            Ok(())
        );
    }

    #[test]
    fn usage_at_limit_is_denied() {
        let org_id = OrgId::new();
        let snapshot = EntitlementsSnapshot::new(org_id).with_limit(LimitKey::Branches, 3);
        let source = CountingSource::new(snapshot.clone(), 3);

        assert_eq!(
            require_within_limit(&source, org_id, Some(&snapshot), LimitKey::Branches),
            Err(EntitlementError::LimitExceeded {
                key: LimitKey::Branches,
                current: 3,
                max: 3,
            })
        );
    }

    #[test]
    fn unconfigured_limit_denies() {
        let org_id = OrgId::new();
        let snapshot = EntitlementsSnapshot::new(org_id);
        let source = CountingSource::new(snapshot.clone(), 0);

        assert_eq!(
            require_within_limit(&source, org_id, Some(&snapshot), LimitKey::Warehouses),
            Err(EntitlementError::LimitExceeded {
                key: LimitKey::Warehouses,
                current: 0,
                max: 0,
            })
        );
    }

    #[test]
    fn missing_snapshot_fails_closed() {
        let org_id = OrgId::new();
        let unrelated = EntitlementsSnapshot::new(OrgId::new());
        let source = CountingSource::new(unrelated, 0);

        assert_eq!(
            require_module_access(&source, org_id, None, &well_known::TRANSFERS),
            Err(EntitlementError::MissingSnapshot(org_id))
        );
    }
}
