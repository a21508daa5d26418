use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use wareflow_auth::{decode_session_claims, validate_claims};

use crate::context::RequestContext;

/// Authenticate a request from its bearer token and attach the per-request
/// context.
///
/// Signature verification happens upstream (the identity provider's edge
/// verifies tokens before they reach this service); here we decode the
/// claims, check the time window, and normalize role grants. A token whose
/// claims cannot be read carries no identity and is rejected outright.
pub async fn auth_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let claims = decode_session_claims(token).map_err(|_e| StatusCode::UNAUTHORIZED)?;
    validate_claims(&claims, Utc::now()).map_err(|_e| StatusCode::UNAUTHORIZED)?;

    let assignments = claims.role_assignments();
    req.extensions_mut()
        .insert(RequestContext::new(claims.sub, assignments));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
