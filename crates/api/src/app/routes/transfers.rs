use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use wareflow_core::DomainError;
use wareflow_entitlements::{require_module_access, well_known as modules};
use wareflow_inventory::{TransferId, TransferRequest};

use crate::app::errors::{self, ActionError};
use crate::app::{dto, services::AppServices};
use crate::authz;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/", post(create_transfer))
}

/// POST /transfers - move stock between two warehouses.
pub async fn create_transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateTransferRequest>,
) -> axum::response::Response {
    match create_transfer_action(&services, &ctx, body) {
        Ok(transfer_id) => (
            StatusCode::CREATED,
            Json(json!({ "transfer_id": transfer_id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn create_transfer_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::CreateTransferRequest,
) -> Result<TransferId, ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;

    require_module_access(
        services.entitlements(),
        org_ctx.org_id(),
        org_ctx.cached_entitlements(),
        &modules::TRANSFERS,
    )?;

    let request = TransferRequest {
        from_warehouse: body.from_warehouse,
        to_warehouse: body.to_warehouse,
        lines: body.lines.into_iter().map(Into::into).collect(),
    };
    request.validate()?;

    // The caller must manage the source branch (or administer the org);
    // receiving stock needs no grant on the destination.
    let source = services
        .inventory()
        .warehouse(request.from_warehouse)
        .filter(|w| w.org_id == org_ctx.org_id())
        .ok_or(DomainError::NotFound)?;
    authz::require_role(
        ctx,
        &authz::branch_manager_checks(org_ctx.org_id(), source.branch_id),
    )?;

    // Stock validation and the movement itself happen in the data store.
    let transfer_id = services
        .inventory()
        .apply_transfer(org_ctx.org_id(), &request)?;

    Ok(transfer_id)
}
