// tests/http_test.rs

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use erp_backend::{
    db::{BusinessRepository, RbacRepository, UserRepository},
    models::rbac::PermissionAction,
    services::auth::AuthService,
};

// Requests rejected before any query never touch this pool.
fn offline_app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://nobody@localhost:1/unused")
        .unwrap();
    erp_backend::router(common::test_state(pool))
}

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_is_public() {
    let (status, _) = send(offline_app(), Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    for (method, uri) in [
        (Method::GET, "/api/users/me"),
        (Method::POST, "/api/vouchers/next"),
        (Method::POST, "/api/sales/day-end"),
        (Method::GET, "/api/sales/day-end/2025-03-31"),
        (Method::DELETE, "/api/sales/day-end/2025-03-31"),
        (Method::POST, "/api/sales/returns"),
        (Method::GET, "/api/sales/returns/SRE-000001"),
        (Method::DELETE, "/api/sales/returns/SRE-000001"),
        (Method::POST, "/api/purchase/orders"),
        (Method::POST, "/api/purchase/grn/GRN-000001/confirm"),
    ] {
        let (status, body) = send(offline_app(), method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], json!("Authentication token is invalid or missing."));
    }
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let (status, _) = send(offline_app(), Method::GET, "/api/users/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn login_then_permissions_gate_each_action() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let username = format!("counter-{zid}");

    let users = UserRepository::new(pool.clone());
    let businesses = BusinessRepository::new(pool.clone());
    let rbac = RbacRepository::new(pool.clone());

    businesses.upsert_business(&pool, zid, "Test Outlet").await.unwrap();
    let hash = AuthService::hash_password("secret").await.unwrap();
    let user = users.create_user(&pool, &username, None, &hash, false).await.unwrap();
    businesses.grant_access(&pool, user.id, zid).await.unwrap();
    let group = rbac.ensure_group(&pool, &format!("cashiers-{zid}")).await.unwrap();
    rbac.add_member(&pool, user.id, group).await.unwrap();
    rbac.grant_module(&pool, zid, "day_end_process", group, &[PermissionAction::View]).await.unwrap();

    let app = erp_backend::router(common::test_state(pool.clone()));

    let (status, _) = send(
        app.clone(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "wrong", "businessId": zid })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "secret", "businessId": zid })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["zid"], json!(zid));
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(app.clone(), Method::GET, "/api/users/me/permissions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modules"]["day_end_process"], json!(["view"]));

    let (status, body) = send(app.clone(), Method::GET, "/api/sales/day-end/2025-03-31", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedVoucher"], Value::Null);

    let (status, body) = send(app.clone(), Method::POST, "/api/sales/day-end", Some(&token), Some(json!({ "date": "2025-03-31" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("You need the 'day_end_process:create' permission to perform this action."));

    rbac.grant_module(&pool, zid, "day_end_process", group, &[PermissionAction::View, PermissionAction::Create])
        .await
        .unwrap();
    let (status, body) = send(app, Method::POST, "/api/sales/day-end", Some(&token), Some(json!({ "date": "2025-03-31" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["status"], json!("noSales"));
}

#[tokio::test]
#[ignore = "needs TEST_DATABASE_URL"]
#[serial]
async fn seeded_admin_can_use_every_module() {
    let pool = common::test_pool().await;
    let zid = common::fresh_zid();
    let username = format!("admin-{zid}");
    let state = common::test_state(pool.clone());

    let seeded = state.setup_service.seed_admin(zid, "Head Office", &username, "s3cret").await.unwrap();
    assert!(seeded.created_user);
    for module in ["pos", "sales_return", "po_create", "po_confirm", "day_end_process", "vouchers"] {
        assert!(seeded.modules.iter().any(|m| m == module), "{module} not granted");
    }

    // A second run keeps the user and its password.
    let again = state.setup_service.seed_admin(zid, "Head Office", &username, "changed").await.unwrap();
    assert!(!again.created_user);
    assert_eq!(again.user_id, seeded.user_id);

    let app = erp_backend::router(state);
    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "s3cret", "businessId": zid })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(app.clone(), Method::GET, "/api/users/me/permissions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modules"]["po_create"], json!(["view", "create", "edit", "delete"]));

    let order = json!({
        "supplier": "SUP-000003",
        "warehouse": "Main",
        "lines": [{ "item": "A", "quantity": 5, "rate": 20 }]
    });
    let (status, body) = send(app.clone(), Method::POST, "/api/purchase/orders", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["poNumber"], json!("PO--000001"));
    assert_eq!(body["grnNumber"], json!("GRN-000001"));

    let (status, _) = send(app, Method::GET, "/api/sales/returns/SRE-999999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(&pool, zid).await;
}
