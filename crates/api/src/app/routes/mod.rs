use axum::{
    Router,
    routing::{get, post},
};

pub mod branches;
pub mod organizations;
pub mod qr;
pub mod system;
pub mod transfers;
pub mod units;
pub mod warehouses;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/me/active-org", post(organizations::switch_organization))
        .route("/me/active-branch", post(branches::switch_branch))
        .nest("/org", organizations::router())
        .nest("/branches", branches::router())
        .nest("/warehouses", warehouses::router())
        .nest("/units", units::router())
        .nest("/transfers", transfers::router())
}
