use std::sync::{Arc, OnceLock};

use wareflow_auth::{AuthError, RoleAssignment};
use wareflow_core::UserId;
use wareflow_directory::OrgContext;
use wareflow_infra::{DirectoryStore, resolve_org_context};

/// Per-request caller context: authenticated identity, role grants, and a
/// memoized organization context slot.
///
/// One instance is created by the auth middleware per request, so repeated
/// checks within a request share a single directory lookup and nothing leaks
/// across requests. There is no ambient global holding "the current org".
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    user_id: UserId,
    assignments: Vec<RoleAssignment>,
    org: OnceLock<Option<Arc<OrgContext>>>,
}

impl RequestContext {
    pub fn new(user_id: UserId, assignments: Vec<RoleAssignment>) -> Self {
        Self {
            inner: Arc::new(Inner {
                user_id,
                assignments,
                org: OnceLock::new(),
            }),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.inner.user_id
    }

    pub fn assignments(&self) -> &[RoleAssignment] {
        &self.inner.assignments
    }

    /// Resolve (at most once per request) the caller's organization context.
    ///
    /// Fails with [`AuthError::NoActiveOrganization`] for unprovisioned
    /// callers; handlers surface that as a 401 and the client redirects to
    /// sign-in or onboarding.
    pub fn require_org_context<S>(&self, store: &S) -> Result<Arc<OrgContext>, AuthError>
    where
        S: DirectoryStore + ?Sized,
    {
        let resolved = self
            .inner
            .org
            .get_or_init(|| resolve_org_context(store, self.inner.user_id).map(Arc::new));

        resolved.clone().ok_or(AuthError::NoActiveOrganization)
    }
}
