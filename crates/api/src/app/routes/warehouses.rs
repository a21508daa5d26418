use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde_json::json;

use wareflow_core::DomainError;
use wareflow_entitlements::{LimitKey, require_within_limit};
use wareflow_inventory::{Warehouse, WarehouseId};

use crate::app::errors::{self, ActionError};
use crate::app::{dto, services::AppServices};
use crate::authz;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_warehouses).post(create_warehouse))
}

/// GET /warehouses - warehouses of the active organization.
pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    let org_ctx = match ctx.require_org_context(services.directory()) {
        Ok(v) => v,
        Err(e) => return errors::action_error_to_response(e.into()),
    };

    let warehouses: Vec<_> = services
        .inventory()
        .warehouses_of(org_ctx.org_id())
        .iter()
        .map(|w| {
            json!({
                "id": w.id.to_string(),
                "branch_id": w.branch_id.to_string(),
                "name": w.name,
            })
        })
        .collect();

    (StatusCode::OK, Json(json!({ "warehouses": warehouses }))).into_response()
}

/// POST /warehouses - create a warehouse under a branch.
pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateWarehouseRequest>,
) -> axum::response::Response {
    match create_warehouse_action(&services, &ctx, body) {
        Ok(warehouse) => (
            StatusCode::CREATED,
            Json(json!({
                "id": warehouse.id.to_string(),
                "branch_id": warehouse.branch_id.to_string(),
                "name": warehouse.name,
            })),
        )
            .into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn create_warehouse_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::CreateWarehouseRequest,
) -> Result<Warehouse, ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;

    let branch = services
        .directory()
        .branch(body.branch_id)
        .filter(|b| b.org_id == org_ctx.org_id())
        .ok_or(DomainError::NotFound)?;

    authz::require_role(ctx, &authz::branch_manager_checks(org_ctx.org_id(), branch.id))?;
    require_within_limit(
        services.entitlements(),
        org_ctx.org_id(),
        org_ctx.cached_entitlements(),
        LimitKey::Warehouses,
    )?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("warehouse name cannot be empty").into());
    }

    let warehouse = Warehouse {
        id: WarehouseId::new(),
        org_id: org_ctx.org_id(),
        branch_id: branch.id,
        name: name.to_string(),
        created_at: Utc::now(),
    };
    services.inventory().upsert_warehouse(warehouse.clone());

    Ok(warehouse)
}
