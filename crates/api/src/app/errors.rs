use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use wareflow_auth::AuthError;
use wareflow_core::DomainError;
use wareflow_entitlements::EntitlementError;
use wareflow_infra::StoreError;

/// Unified failure type for guarded actions.
///
/// Every guarded action resolves context, runs its checks, then mutates; a
/// failure at any step lands here and the mutation never runs. Handlers map
/// this to a JSON error response in exactly one place.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn action_error_to_response(err: ActionError) -> axum::response::Response {
    match err {
        ActionError::Auth(AuthError::Unauthenticated) => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "unauthenticated")
        }
        ActionError::Auth(AuthError::NoActiveOrganization) => json_error(
            StatusCode::UNAUTHORIZED,
            "no_active_organization",
            "no active organization",
        ),
        ActionError::Auth(err @ AuthError::Forbidden(_)) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        ActionError::Entitlement(err @ EntitlementError::ModuleDisabled(_)) => {
            json_error(StatusCode::FORBIDDEN, "module_disabled", err.to_string())
        }
        ActionError::Entitlement(err @ EntitlementError::LimitExceeded { .. }) => {
            json_error(StatusCode::FORBIDDEN, "limit_exceeded", err.to_string())
        }
        ActionError::Entitlement(err @ EntitlementError::MissingSnapshot(_)) => json_error(
            StatusCode::FORBIDDEN,
            "entitlements_unavailable",
            err.to_string(),
        ),
        ActionError::Entitlement(err @ EntitlementError::Source(_)) => json_error(
            StatusCode::BAD_GATEWAY,
            "entitlement_source_error",
            err.to_string(),
        ),
        ActionError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        ActionError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        ActionError::Domain(DomainError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ActionError::Domain(err) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "domain_error", err.to_string())
        }
        ActionError::Store(StoreError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        ActionError::Store(err @ StoreError::InsufficientStock { .. }) => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_stock",
            err.to_string(),
        ),
        ActionError::Store(StoreError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ActionError::Store(err @ StoreError::Backend(_)) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            err.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
