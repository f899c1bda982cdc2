use axum::http::StatusCode;
use serde_json::json;
use serial_test::serial;

use crate::common::{test_email, test_password, TestContext};

#[tokio::test]
#[serial]
async fn register_with_valid_data_returns_created() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Test User",
            "email": test_email(),
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert!(body.get("token").is_some());
    assert!(body["user"].get("id").is_some());
    assert!(body["user"].get("email").is_some());
    // The hash must never leave the server
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_duplicate_email_returns_conflict_and_no_extra_user() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let email = test_email();

    let first = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Test User",
            "email": &email,
            "password": test_password()
        }))
        .await;
    first.assert_status(StatusCode::CREATED);

    let second = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Someone Else",
            "email": &email,
            "password": test_password()
        }))
        .await;
    second.assert_status(StatusCode::CONFLICT);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_invalid_email_returns_bad_request() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Test User",
            "email": "not-an-email",
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn register_with_short_password_returns_bad_request() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "name": "Test User",
            "email": test_email(),
            "password": "short"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}
