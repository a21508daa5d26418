use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use wareflow_api::app::build_app_with_services;
use wareflow_api::app::services::AppServices;
use wareflow_auth::{Role, SessionClaims, WireRoleAssignment, WireScope};
use wareflow_core::{BranchId, OrgId, UserId};
use wareflow_directory::{Branch, OrgMembership, Organization, QrLink};
use wareflow_entitlements::{EntitlementsSnapshot, LimitKey, well_known as modules};
use wareflow_infra::{
    DirectoryStore, InMemoryDirectoryStore, InMemoryEntitlementStore, InMemoryInventoryStore,
    InventoryStore,
};
use wareflow_inventory::{Unit, UnitId, Warehouse, WarehouseId};

struct TestApp {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    directory: Arc<InMemoryDirectoryStore>,
    inventory: Arc<InMemoryInventoryStore>,
    entitlements: Arc<InMemoryEntitlementStore>,
}

impl TestApp {
    async fn spawn() -> Self {
        let directory = Arc::new(InMemoryDirectoryStore::new());
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let entitlements = Arc::new(InMemoryEntitlementStore::new(
            directory.clone(),
            inventory.clone(),
        ));
        let services = Arc::new(AppServices::InMemory {
            directory: directory.clone(),
            inventory: inventory.clone(),
            entitlements: entitlements.clone(),
        });

        // Same router as prod, bound to an ephemeral port.
        let app = build_app_with_services(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handle,
            directory,
            inventory,
            entitlements,
        }
    }

    /// Seed an organization with one member and one branch ("main").
    fn seed_org(&self, user_id: UserId, name: &str) -> (OrgId, BranchId) {
        let org_id = OrgId::new();
        self.directory
            .upsert_organization(Organization::new(org_id, name, Utc::now()));
        self.directory.add_membership(OrgMembership {
            org_id,
            user_id,
            joined_at: Utc::now(),
        });

        let branch = Branch::new(BranchId::new(), org_id, "main", Utc::now());
        let branch_id = branch.id;
        self.directory.upsert_branch(branch);

        (org_id, branch_id)
    }

    fn seed_warehouse(&self, org_id: OrgId, branch_id: BranchId, name: &str) -> WarehouseId {
        let warehouse = Warehouse {
            id: WarehouseId::new(),
            org_id,
            branch_id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let id = warehouse.id;
        self.inventory.upsert_warehouse(warehouse);
        id
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_token(user_id: UserId, roles: Vec<WireRoleAssignment>) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id,
        roles,
        iat: now - 10,
        exp: now + 600,
    };

    // The service reads claims without verifying signatures (that happens at
    // the identity edge), but tokens in tests are still real HS256 JWTs.
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("failed to encode token")
}

fn org_role(name: &str, org_id: OrgId) -> WireRoleAssignment {
    WireRoleAssignment::Tagged {
        role: Role::new(name.to_string()),
        scope: WireScope::Org,
        scope_id: *org_id.as_uuid(),
    }
}

/// The legacy split wire shape, exercised end-to-end.
fn branch_role_legacy(name: &str, org_id: OrgId, branch_id: BranchId) -> WireRoleAssignment {
    WireRoleAssignment::Split {
        role: Role::new(name.to_string()),
        org_id: Some(org_id),
        branch_id: Some(branch_id),
    }
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let app = TestApp::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/whoami", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn whoami_returns_normalized_assignments() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");

    let token = mint_token(
        user_id,
        vec![
            org_role("org_owner", org_id),
            branch_role_legacy("branch_manager", org_id, branch_id),
        ],
    );

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user_id"].as_str().unwrap(), user_id.to_string());

    let roles = body["roles"].as_array().unwrap();
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0]["role"], "org_owner");
    assert_eq!(roles[0]["scope"], "org");
    // The split-shape grant comes back normalized to its branch scope.
    assert_eq!(roles[1]["role"], "branch_manager");
    assert_eq!(roles[1]["scope"], "branch");
    assert_eq!(roles[1]["scope_id"], branch_id.to_string());
}

#[tokio::test]
async fn unprovisioned_caller_gets_no_org_context() {
    let app = TestApp::spawn().await;
    let token = mint_token(UserId::new(), vec![]);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/org", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_active_organization");
}

#[tokio::test]
async fn organization_update_is_role_gated() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, _branch_id) = app.seed_org(user_id, "acme");

    let client = reqwest::Client::new();

    // Staff cannot rename the organization.
    let staff_token = mint_token(user_id, vec![org_role("staff", org_id)]);
    let res = client
        .put(format!("{}/org", app.base_url))
        .bearer_auth(&staff_token)
        .json(&json!({ "name": "Acme Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.directory.organization(org_id).unwrap().name, "acme");

    // The owner can.
    let owner_token = mint_token(user_id, vec![org_role("org_owner", org_id)]);
    let res = client
        .put(format!("{}/org", app.base_url))
        .bearer_auth(&owner_token)
        .json(&json!({ "name": "Acme Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        app.directory.organization(org_id).unwrap().name,
        "Acme Renamed"
    );
}

#[tokio::test]
async fn owner_role_on_another_org_grants_nothing() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, _branch_id) = app.seed_org(user_id, "acme");

    // org_owner, but scoped to a different organization id.
    let token = mint_token(user_id, vec![org_role("org_owner", OrgId::new())]);

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/org", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "hijacked" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.directory.organization(org_id).unwrap().name, "acme");
}

#[tokio::test]
async fn branch_creation_respects_the_plan_limit() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, _branch_id) = app.seed_org(user_id, "acme");

    app.entitlements
        .set_snapshot(EntitlementsSnapshot::new(org_id).with_limit(LimitKey::Branches, 2));

    let token = mint_token(user_id, vec![org_role("org_admin", org_id)]);
    let client = reqwest::Client::new();

    // One branch exists; the second fits the limit of two.
    let res = client
        .post(format!("{}/branches", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "east" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // The third does not.
    let res = client
        .post(format!("{}/branches", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "west" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "limit_exceeded");
    assert_eq!(app.directory.branches_of(org_id).len(), 2);
}

#[tokio::test]
async fn transfer_requires_the_transfers_module() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");

    // Plan without the transfers module.
    app.entitlements
        .set_snapshot(EntitlementsSnapshot::new(org_id));

    let from = app.seed_warehouse(org_id, branch_id, "central");
    let to = app.seed_warehouse(org_id, branch_id, "overflow");
    app.inventory.set_stock_level(from, "SKU-1", None, 10);

    let token = mint_token(user_id, vec![org_role("org_admin", org_id)]);
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/transfers", app.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "from_warehouse": from.to_string(),
            "to_warehouse": to.to_string(),
            "lines": [{ "sku": "SKU-1", "quantity": 4 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "module_disabled");
    assert_eq!(app.inventory.stock_level(from, "SKU-1"), 10);
}

#[tokio::test]
async fn transfer_moves_stock_for_a_branch_manager() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");

    app.entitlements
        .set_snapshot(EntitlementsSnapshot::new(org_id).with_module(modules::TRANSFERS));

    let from = app.seed_warehouse(org_id, branch_id, "central");
    let to = app.seed_warehouse(org_id, branch_id, "overflow");
    app.inventory.set_stock_level(from, "SKU-1", None, 10);

    // Branch-manager grant carried in the legacy split wire shape.
    let token = mint_token(
        user_id,
        vec![branch_role_legacy("branch_manager", org_id, branch_id)],
    );

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/transfers", app.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "from_warehouse": from.to_string(),
            "to_warehouse": to.to_string(),
            "lines": [{ "sku": "SKU-1", "quantity": 4 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["transfer_id"].is_string());

    assert_eq!(app.inventory.stock_level(from, "SKU-1"), 6);
    assert_eq!(app.inventory.stock_level(to, "SKU-1"), 4);
}

#[tokio::test]
async fn transfer_with_insufficient_stock_is_rejected_by_the_store() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");

    app.entitlements
        .set_snapshot(EntitlementsSnapshot::new(org_id).with_module(modules::TRANSFERS));

    let from = app.seed_warehouse(org_id, branch_id, "central");
    let to = app.seed_warehouse(org_id, branch_id, "overflow");
    app.inventory.set_stock_level(from, "SKU-1", None, 2);

    let token = mint_token(user_id, vec![org_role("org_admin", org_id)]);
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/transfers", app.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "from_warehouse": from.to_string(),
            "to_warehouse": to.to_string(),
            "lines": [{ "sku": "SKU-1", "quantity": 5 }],
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(app.inventory.stock_level(from, "SKU-1"), 2);
    assert_eq!(app.inventory.stock_level(to, "SKU-1"), 0);
}

#[tokio::test]
async fn stale_session_snapshot_is_never_trusted() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");

    // Authoritative plan: transfers disabled.
    app.entitlements
        .set_snapshot(EntitlementsSnapshot::new(org_id));

    // Stale session cache from a previous org claims transfers are enabled.
    app.directory.set_session_snapshot(
        user_id,
        EntitlementsSnapshot::new(OrgId::new()).with_module(modules::TRANSFERS),
    );

    let from = app.seed_warehouse(org_id, branch_id, "central");
    let to = app.seed_warehouse(org_id, branch_id, "overflow");
    app.inventory.set_stock_level(from, "SKU-1", None, 10);

    let token = mint_token(user_id, vec![org_role("org_admin", org_id)]);
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/transfers", app.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "from_warehouse": from.to_string(),
            "to_warehouse": to.to_string(),
            "lines": [{ "sku": "SKU-1", "quantity": 4 }],
        }))
        .send()
        .await
        .unwrap();

    // The mismatched snapshot is discarded and the authoritative plan denies.
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.inventory.stock_level(from, "SKU-1"), 10);
}

#[tokio::test]
async fn switching_organizations_changes_the_resolved_context() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (first_org, _) = app.seed_org(user_id, "first");
    let (second_org, _) = app.seed_org(user_id, "second");

    let token = mint_token(user_id, vec![]);
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/org", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["org"]["id"], first_org.to_string());

    let res = client
        .post(format!("{}/me/active-org", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "org_id": second_org.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/org", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["org"]["id"], second_org.to_string());

    // Switching into an org without membership is refused.
    let res = client
        .post(format!("{}/me/active-org", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "org_id": OrgId::new().to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn switching_branches_is_scoped_to_the_active_org() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");
    let (_other_org, other_branch) = app.seed_org(UserId::new(), "other");

    let token = mint_token(user_id, vec![]);
    let client = reqwest::Client::new();

    // A branch of someone else's org does not exist from our point of view.
    let res = client
        .post(format!("{}/me/active-branch", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "branch_id": other_branch.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/me/active-branch", app.base_url))
        .bearer_auth(&token)
        .json(&json!({ "branch_id": branch_id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/org", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["active_branch"]["id"], branch_id.to_string());
    assert_eq!(body["org"]["id"], org_id.to_string());
}

#[tokio::test]
async fn unit_deletion_is_refused_while_stock_references_it() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");

    let unit = Unit {
        id: UnitId::new(),
        org_id,
        name: "kilogram".to_string(),
        abbreviation: "kg".to_string(),
    };
    app.inventory.upsert_unit(unit.clone());

    let warehouse = app.seed_warehouse(org_id, branch_id, "central");
    app.inventory
        .set_stock_level(warehouse, "SKU-1", Some(unit.id), 5);

    let token = mint_token(user_id, vec![org_role("org_admin", org_id)]);
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/units/{}", app.base_url, unit.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    app.inventory.set_stock_level(warehouse, "SKU-1", None, 5);
    let res = client
        .delete(format!("{}/units/{}", app.base_url, unit.id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_a_branch_with_warehouses_conflicts() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, branch_id) = app.seed_org(user_id, "acme");
    app.seed_warehouse(org_id, branch_id, "central");

    let token = mint_token(user_id, vec![org_role("org_owner", org_id)]);
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/branches/{}", app.base_url, branch_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(app.directory.branch(branch_id).is_some());
}

#[tokio::test]
async fn qr_codes_redirect_without_authentication() {
    let app = TestApp::spawn().await;
    let (org_id, _branch_id) = app.seed_org(UserId::new(), "acme");

    app.directory.upsert_qr_link(QrLink::new(
        "WH-42",
        org_id,
        "/warehouses/42",
    ));

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let res = client
        .get(format!("{}/qr/WH-42", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        res.headers().get("location").unwrap().to_str().unwrap(),
        "/warehouses/42"
    );

    let res = client
        .get(format!("{}/qr/NOPE", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let app = TestApp::spawn().await;
    let user_id = UserId::new();
    let (org_id, _branch_id) = app.seed_org(user_id, "acme");

    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id,
        roles: vec![org_role("org_owner", org_id)],
        iat: now - 7_200,
        exp: now - 3_600,
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap();

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", app.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
