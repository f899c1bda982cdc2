use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{register_user, test_password, TestContext};

#[tokio::test]
#[serial]
async fn login_with_valid_credentials_returns_token() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &user.email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body.get("token").is_some());
    assert_eq!(body["user"]["email"].as_str(), Some(user.email.as_str()));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn login_failures_use_identical_message() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    // Account enumeration guard: both failure modes look the same
    let unknown_email = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": test_password()
        }))
        .await;
    unknown_email.assert_status(StatusCode::UNAUTHORIZED);

    let wrong_password = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &user.email,
            "password": "definitely-wrong"
        }))
        .await;
    wrong_password.assert_status(StatusCode::UNAUTHORIZED);

    let a: serde_json::Value = unknown_email.json();
    let b: serde_json::Value = wrong_password.json();
    assert_eq!(a, b);

    ctx.cleanup().await;
}
