use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;

use wareflow_entitlements::{LimitKey, require_within_limit};
use wareflow_inventory::{Unit, UnitId};

use crate::app::errors::{self, ActionError};
use crate::app::{dto, services::AppServices};
use crate::authz;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/:id", delete(delete_unit))
}

/// GET /units - units of measure of the active organization.
pub async fn list_units(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    let org_ctx = match ctx.require_org_context(services.directory()) {
        Ok(v) => v,
        Err(e) => return errors::action_error_to_response(e.into()),
    };

    let units: Vec<_> = services
        .inventory()
        .units_of(org_ctx.org_id())
        .iter()
        .map(|u| {
            json!({
                "id": u.id.to_string(),
                "name": u.name,
                "abbreviation": u.abbreviation,
            })
        })
        .collect();

    (StatusCode::OK, Json(json!({ "units": units }))).into_response()
}

/// POST /units - create a unit of measure (org admins, within the plan limit).
pub async fn create_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateUnitRequest>,
) -> axum::response::Response {
    match create_unit_action(&services, &ctx, body) {
        Ok(unit) => (
            StatusCode::CREATED,
            Json(json!({
                "id": unit.id.to_string(),
                "name": unit.name,
                "abbreviation": unit.abbreviation,
            })),
        )
            .into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn create_unit_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::CreateUnitRequest,
) -> Result<Unit, ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;
    authz::require_role(ctx, &authz::org_admin_checks(org_ctx.org_id()))?;
    require_within_limit(
        services.entitlements(),
        org_ctx.org_id(),
        org_ctx.cached_entitlements(),
        LimitKey::Units,
    )?;

    let unit = Unit {
        id: UnitId::new(),
        org_id: org_ctx.org_id(),
        name: body.name.trim().to_string(),
        abbreviation: body.abbreviation.trim().to_string(),
    };
    unit.validate()?;

    services.inventory().upsert_unit(unit.clone());
    Ok(unit)
}

/// DELETE /units/:id - delete a unit (org admins; refused while referenced).
pub async fn delete_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let unit_id: UnitId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid unit id");
        }
    };

    match delete_unit_action(&services, &ctx, unit_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn delete_unit_action(
    services: &AppServices,
    ctx: &RequestContext,
    unit_id: UnitId,
) -> Result<(), ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;
    authz::require_role(ctx, &authz::org_admin_checks(org_ctx.org_id()))?;

    // Referential protection lives in the data store: the delete is refused
    // while stock still references the unit.
    services.inventory().delete_unit(org_ctx.org_id(), unit_id)?;
    Ok(())
}
