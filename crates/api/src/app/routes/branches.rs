use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use chrono::Utc;
use serde_json::json;

use wareflow_core::{BranchId, DomainError};
use wareflow_directory::{Branch, UserPreferences};
use wareflow_entitlements::{LimitKey, require_within_limit};

use crate::app::errors::{self, ActionError};
use crate::app::{dto, services::AppServices};
use crate::authz;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_branches).post(create_branch))
        .route("/:id", delete(delete_branch))
}

/// GET /branches - branches of the active organization.
pub async fn list_branches(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    let org_ctx = match ctx.require_org_context(services.directory()) {
        Ok(v) => v,
        Err(e) => return errors::action_error_to_response(e.into()),
    };

    let branches: Vec<_> = org_ctx
        .available_branches
        .iter()
        .map(|b| json!({ "id": b.id.to_string(), "name": b.name }))
        .collect();

    (StatusCode::OK, Json(json!({ "branches": branches }))).into_response()
}

/// POST /branches - create a branch (org admins, within the plan limit).
pub async fn create_branch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::CreateBranchRequest>,
) -> axum::response::Response {
    match create_branch_action(&services, &ctx, body) {
        Ok(branch) => (
            StatusCode::CREATED,
            Json(json!({ "id": branch.id.to_string(), "name": branch.name })),
        )
            .into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn create_branch_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::CreateBranchRequest,
) -> Result<Branch, ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;
    authz::require_role(ctx, &authz::org_admin_checks(org_ctx.org_id()))?;
    require_within_limit(
        services.entitlements(),
        org_ctx.org_id(),
        org_ctx.cached_entitlements(),
        LimitKey::Branches,
    )?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("branch name cannot be empty").into());
    }

    let branch = Branch::new(BranchId::new(), org_ctx.org_id(), name, Utc::now());
    services.directory().upsert_branch(branch.clone());

    Ok(branch)
}

/// DELETE /branches/:id - delete an empty branch (org admins).
pub async fn delete_branch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let branch_id: BranchId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid branch id");
        }
    };

    match delete_branch_action(&services, &ctx, branch_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn delete_branch_action(
    services: &AppServices,
    ctx: &RequestContext,
    branch_id: BranchId,
) -> Result<(), ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;
    authz::require_role(ctx, &authz::org_admin_checks(org_ctx.org_id()))?;

    let branch = services
        .directory()
        .branch(branch_id)
        .filter(|b| b.org_id == org_ctx.org_id())
        .ok_or(DomainError::NotFound)?;

    let has_warehouses = services
        .inventory()
        .warehouses_of(org_ctx.org_id())
        .iter()
        .any(|w| w.branch_id == branch.id);
    if has_warehouses {
        return Err(DomainError::conflict("branch still has warehouses").into());
    }

    services.directory().delete_branch(branch.id);
    Ok(())
}

/// POST /me/active-branch - switch the caller's active branch.
pub async fn switch_branch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::SwitchBranchRequest>,
) -> axum::response::Response {
    match switch_branch_action(&services, &ctx, body) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn switch_branch_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::SwitchBranchRequest,
) -> Result<(), ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;

    if !org_ctx
        .available_branches
        .iter()
        .any(|b| b.id == body.branch_id)
    {
        return Err(DomainError::NotFound.into());
    }

    services.directory().upsert_preferences(UserPreferences {
        user_id: ctx.user_id(),
        active_org_id: Some(org_ctx.org_id()),
        active_branch_id: Some(body.branch_id),
    });

    Ok(())
}
