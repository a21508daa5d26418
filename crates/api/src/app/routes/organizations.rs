use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use wareflow_auth::AuthError;
use wareflow_core::DomainError;
use wareflow_directory::{OrgContext, Organization, UserPreferences};

use crate::app::errors::{self, ActionError};
use crate::app::{dto, services::AppServices};
use crate::authz;
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new().route("/", get(get_organization).put(update_organization))
}

fn context_payload(ctx: &OrgContext) -> serde_json::Value {
    json!({
        "org": { "id": ctx.org.id.to_string(), "name": ctx.org.name },
        "active_branch": ctx.branch.as_ref().map(|b| json!({
            "id": b.id.to_string(),
            "name": b.name,
        })),
        "available_branches": ctx.available_branches.iter().map(|b| json!({
            "id": b.id.to_string(),
            "name": b.name,
        })).collect::<Vec<_>>(),
    })
}

/// GET /org - the caller's resolved organization/branch context.
pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match ctx.require_org_context(services.directory()) {
        Ok(org_ctx) => (StatusCode::OK, Json(context_payload(&org_ctx))).into_response(),
        Err(e) => errors::action_error_to_response(e.into()),
    }
}

/// PUT /org - rename the active organization.
pub async fn update_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::UpdateOrganizationRequest>,
) -> axum::response::Response {
    match update_organization_action(&services, &ctx, body) {
        Ok(org) => (
            StatusCode::OK,
            Json(json!({ "id": org.id.to_string(), "name": org.name })),
        )
            .into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn update_organization_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::UpdateOrganizationRequest,
) -> Result<Organization, ActionError> {
    let org_ctx = ctx.require_org_context(services.directory())?;
    authz::require_role(ctx, &authz::org_admin_checks(org_ctx.org_id()))?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("organization name cannot be empty").into());
    }

    let mut org = org_ctx.org.clone();
    org.name = name.to_string();
    services.directory().upsert_organization(org.clone());

    Ok(org)
}

/// POST /me/active-org - switch the caller's active organization.
pub async fn switch_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<dto::SwitchOrganizationRequest>,
) -> axum::response::Response {
    match switch_organization_action(&services, &ctx, body) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::action_error_to_response(e),
    }
}

fn switch_organization_action(
    services: &AppServices,
    ctx: &RequestContext,
    body: dto::SwitchOrganizationRequest,
) -> Result<(), ActionError> {
    // Membership gates the switch; roles inside the target org are the
    // target org's business once the caller is there.
    let memberships = services.directory().memberships_of(ctx.user_id());
    if !memberships.iter().any(|m| m.org_id == body.org_id) {
        return Err(AuthError::Forbidden("membership in the target organization".to_string()).into());
    }

    services.directory().upsert_preferences(UserPreferences {
        user_id: ctx.user_id(),
        active_org_id: Some(body.org_id),
        active_branch_id: None,
    });

    Ok(())
}
