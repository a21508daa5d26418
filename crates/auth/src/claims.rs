use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use wareflow_core::{BranchId, OrgId, UserId};

use crate::{Role, RoleAssignment};

/// Session token claims (transport-agnostic).
///
/// This is the minimal set of claims Wareflow expects once a token has been
/// verified by the upstream identity layer. Signature verification is
/// intentionally outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Role grants carried by the token, in one of two legacy wire shapes.
    #[serde(default)]
    pub roles: Vec<WireRoleAssignment>,

    /// Issued-at timestamp (unix seconds).
    pub iat: i64,

    /// Expiration timestamp (unix seconds).
    pub exp: i64,
}

impl SessionClaims {
    /// Normalized role assignments carried by this token.
    ///
    /// Entries without a usable scope are dropped (see
    /// [`WireRoleAssignment::normalize`]).
    pub fn role_assignments(&self) -> Vec<RoleAssignment> {
        self.roles
            .iter()
            .cloned()
            .filter_map(WireRoleAssignment::normalize)
            .collect()
    }
}

/// Scope tag of the explicit wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireScope {
    Org,
    Branch,
}

/// A `roles` claim entry as it appears on the wire.
///
/// Two shapes are in circulation: an explicit `{role, scope, scope_id}`
/// record, and an older `{role, org_id, branch_id}` record where the scope is
/// implied by which id is non-null. Neither is treated as canonical; both
/// normalize into [`RoleAssignment`] here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireRoleAssignment {
    Tagged {
        role: Role,
        scope: WireScope,
        scope_id: Uuid,
    },
    Split {
        role: Role,
        #[serde(default)]
        org_id: Option<OrgId>,
        #[serde(default)]
        branch_id: Option<BranchId>,
    },
}

impl WireRoleAssignment {
    /// Collapse a wire entry into the unified assignment variant.
    ///
    /// In the split shape a non-null `branch_id` wins over `org_id` (the most
    /// specific scope). Entries with no usable scope are dropped.
    pub fn normalize(self) -> Option<RoleAssignment> {
        match self {
            WireRoleAssignment::Tagged {
                role,
                scope: WireScope::Org,
                scope_id,
            } => Some(RoleAssignment::org(role, OrgId::from_uuid(scope_id))),
            WireRoleAssignment::Tagged {
                role,
                scope: WireScope::Branch,
                scope_id,
            } => Some(RoleAssignment::branch(role, BranchId::from_uuid(scope_id))),
            WireRoleAssignment::Split {
                role,
                branch_id: Some(branch_id),
                ..
            } => Some(RoleAssignment::branch(role, branch_id)),
            WireRoleAssignment::Split {
                role,
                org_id: Some(org_id),
                branch_id: None,
            } => Some(RoleAssignment::org(role, org_id)),
            WireRoleAssignment::Split {
                role,
                org_id: None,
                branch_id: None,
            } => {
                tracing::warn!(role = role.as_str(), "dropping role claim with no scope id");
                None
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the claim time window.
///
/// Note: this validates the *claims* only. Signature verification happens
/// upstream, before the token reaches this layer.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now.timestamp() < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
