use thiserror::Error;

/// Result type for request-boundary authorization.
pub type AuthResult<T> = Result<T, AuthError>;

/// Authorization failure at the request boundary.
///
/// Guarded actions fail closed: any of these denies the mutation before the
/// data store is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable session accompanied the request.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The caller has a session but no active organization membership.
    #[error("no active organization")]
    NoActiveOrganization,

    /// The caller's role assignments satisfy none of the required checks.
    #[error("forbidden: requires one of [{0}]")]
    Forbidden(String),
}
