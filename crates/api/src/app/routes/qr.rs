use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};

use crate::app::errors;
use crate::app::services::AppServices;

/// GET /qr/:code - public lookup-and-redirect for printed QR labels.
pub async fn resolve(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.directory().qr_link(&code) {
        Some(link) => Redirect::temporary(&link.target_path).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "unknown code"),
    }
}
