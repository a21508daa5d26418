//! `wareflow-auth` — pure authorization boundary (zero-trust).
//!
//! Scoped role matching, session-claim normalization, and fail-closed role
//! extraction. This crate is intentionally decoupled from HTTP and storage.

pub mod assignment;
pub mod check;
pub mod claims;
pub mod error;
pub mod matcher;
pub mod roles;
pub mod token;

pub use assignment::{RoleAssignment, RoleScope};
pub use check::{RoleCheck, ScopeFilter};
pub use claims::{SessionClaims, TokenValidationError, WireRoleAssignment, WireScope, validate_claims};
pub use error::{AuthError, AuthResult};
pub use matcher::has_matching_role;
pub use roles::{Role, well_known};
pub use token::{TokenDecodeError, decode_session_claims, roles_from_token};
