#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use mongodb::bson::doc;
use serde_json::{Value, json};
use tower::ServiceExt; // for oneshot

use docreach::app::build_router;
use docreach::models::Role;
use docreach::state::set_platform_enabled;

fn app_for(ctx: &common::TestContext) -> Router {
    build_router(Arc::new(ctx.state.clone()))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn login_resolves_both_principal_stores() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    docreach::state::create_staff(
        &ctx.state,
        "Asha",
        "asha.admin",
        "secret123",
        Role::Admin,
        None,
    )
    .await
    .expect("staff");
    let location = common::seed_location(&ctx.state).await;
    let exec = common::seed_executive(&ctx.state, &location).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "asha.admin", "password": "secret123" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "admin");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "username": exec.username, "password": exec.password })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["role"], "executive");

    let response = app
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "asha.admin", "password": "wrong" })),
        ))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    let response = app
        .oneshot(request("GET", "/transactions", None, None))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn executives_may_not_mutate_transactions() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    let location = common::seed_location(&ctx.state).await;
    let doctor = common::seed_doctor(&ctx.state, &location, None).await;
    let exec = common::seed_executive(&ctx.state, &location).await;
    let token = common::token_for(&ctx.state, &exec.id.expect("id")).await;

    let create_body = json!({
        "doctorId": doctor.to_hex(),
        "locationId": location.to_hex(),
        "amount": 100.0,
        "paymentMode": "Cash",
        "monthYear": "05/2026",
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/transactions", Some(&token), Some(create_body)))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let fake = mongodb::bson::oid::ObjectId::new().to_hex();
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/transactions/{fake}"),
            Some(&token),
            Some(json!({ "amount": 1.0 })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            "DELETE",
            &format!("/transactions/{fake}"),
            Some(&token),
            None,
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn platform_gate_blocks_everyone_but_admin_tier() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    let admin = common::seed_staff(&ctx.state, Role::Admin).await;
    let admin_token = common::token_for(&ctx.state, &admin).await;
    let location = common::seed_location(&ctx.state).await;
    let exec = common::seed_executive(&ctx.state, &location).await;
    let exec_token = common::token_for(&ctx.state, &exec.id.expect("id")).await;

    set_platform_enabled(&ctx.state, false).await.expect("disable");

    let response = app
        .clone()
        .oneshot(request("GET", "/transactions", Some(&exec_token), None))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["platformDisabled"], true);

    // Admin passes the closed gate.
    let response = app
        .clone()
        .oneshot(request("GET", "/transactions", Some(&admin_token), None))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    // The settings endpoints stay reachable for everyone authenticated.
    let response = app
        .clone()
        .oneshot(request("GET", "/platform-settings", Some(&exec_token), None))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    // Re-enable over HTTP and the executive is back in.
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            "/platform-settings",
            Some(&admin_token),
            Some(json!({ "isEnabled": true })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", "/transactions", Some(&exec_token), None))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn doctor_phone_numbers_normalize_and_collide() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    let admin = common::seed_staff(&ctx.state, Role::Superadmin).await;
    let token = common::token_for(&ctx.state, &admin).await;
    let location = common::seed_location(&ctx.state).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/doctors",
            Some(&token),
            Some(json!({
                "name": "Dr. Rao",
                "phone": "+91 9876543210",
                "locationId": location.to_hex(),
            })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["phone"], "+91-9876543210");

    // Same number in a different accepted spelling is a conflict.
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/doctors",
            Some(&token),
            Some(json!({
                "name": "Dr. Iyer",
                "phone": "9876543210",
                "locationId": location.to_hex(),
            })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Malformed numbers are rejected outright.
    let response = app
        .oneshot(request(
            "POST",
            "/doctors",
            Some(&token),
            Some(json!({
                "name": "Dr. Nair",
                "phone": "1234567890",
                "locationId": location.to_hex(),
            })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn otp_verification_round_trip_over_http() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    let admin = common::seed_staff(&ctx.state, Role::Accountant).await;
    let staff_token = common::token_for(&ctx.state, &admin).await;
    let location = common::seed_location(&ctx.state).await;
    let doctor = common::seed_doctor(&ctx.state, &location, Some("dr@example.com")).await;
    let exec = common::seed_executive(&ctx.state, &location).await;
    let exec_id = exec.id.expect("id");
    let exec_token = common::token_for(&ctx.state, &exec_id).await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/transactions",
            Some(&staff_token),
            Some(json!({
                "doctorId": doctor.to_hex(),
                "executiveId": exec_id.to_hex(),
                "locationId": location.to_hex(),
                "amount": 1500.0,
                "paymentMode": "Cash",
                "monthYear": "06/2026",
            })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "in_progress");
    // The OTP never appears in API responses.
    assert!(created.get("otp").is_none());
    let id = created["id"].as_str().expect("id").to_string();

    let stored = ctx
        .state
        .transactions
        .find_one(doc! { "_id": mongodb::bson::oid::ObjectId::parse_str(&id).expect("oid") })
        .await
        .expect("lookup")
        .expect("stored");
    let otp = stored.otp.expect("otp in store");

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/transactions/{id}/verify-otp"),
            Some(&exec_token),
            Some(json!({ "otp": "000000" })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/transactions/{id}/verify-otp"),
            Some(&exec_token),
            Some(json!({ "otp": otp })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
    assert!(body["deliveryDate"].as_str().is_some_and(|d| !d.is_empty()));

    // The executive now sees their completed delivery in the list.
    let response = app
        .oneshot(request("GET", "/transactions", Some(&exec_token), None))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let listed = listed.as_array().expect("array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn bulk_create_reports_partial_success_over_http() {
    let Some(ctx) = common::setup_state().await else { return };
    let app = app_for(&ctx);

    let admin = common::seed_staff(&ctx.state, Role::Admin).await;
    let token = common::token_for(&ctx.state, &admin).await;
    let location = common::seed_location(&ctx.state).await;
    let doctor = common::seed_doctor(&ctx.state, &location, None).await;

    let good = json!({
        "doctorId": doctor.to_hex(),
        "locationId": location.to_hex(),
        "amount": 10.0,
        "paymentMode": "OnlineTransfer",
        "monthYear": "07/2026",
    });
    let bad = json!({
        "doctorId": mongodb::bson::oid::ObjectId::new().to_hex(),
        "locationId": location.to_hex(),
        "amount": 20.0,
        "paymentMode": "OnlineTransfer",
        "monthYear": "07/2026",
    });

    let response = app
        .oneshot(request(
            "POST",
            "/transactions/bulk",
            Some(&token),
            Some(json!({ "transactions": [good.clone(), bad, good] })),
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["createdCount"], 2);
    assert_eq!(body["failedCount"], 1);
    assert_eq!(body["errors"][0]["row"], 2);

    common::teardown(Some(ctx)).await;
}
