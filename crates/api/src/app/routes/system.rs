use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "user_id": ctx.user_id().to_string(),
        "roles": ctx.assignments(),
    }))
}
