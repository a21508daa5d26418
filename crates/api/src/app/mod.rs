//! HTTP application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: store backend wiring (in-memory by default, Postgres
//!   behind the `postgres` feature)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs
//! - `errors.rs`: the unified guarded-action error and its JSON mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app() -> Router {
    let services = Arc::new(services::build_services().await);
    build_app_with_services(services)
}

/// Build the router over pre-constructed services.
///
/// Tests use this to seed the in-memory stores before the first request.
pub fn build_app_with_services(services: Arc<services::AppServices>) -> Router {
    // Authenticated routes: bearer token required, request context attached.
    let protected = routes::router().layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/qr/:code", get(routes::qr::resolve))
        .merge(protected)
        .layer(Extension(services))
}
