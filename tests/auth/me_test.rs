use axum::http::StatusCode;
use serial_test::serial;

use crate::common::{register_user, TestContext};

#[tokio::test]
#[serial]
async fn me_returns_current_user() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let response = ctx
        .server
        .get("/auth/me")
        .authorization_bearer(&user.token)
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"].as_str(), Some(user.id.as_str()));
    assert_eq!(body["email"].as_str(), Some(user.email.as_str()));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn me_without_token_returns_unauthorized() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let response = ctx.server.get("/auth/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn me_with_garbage_token_returns_unauthorized() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let response = ctx
        .server
        .get("/auth/me")
        .authorization_bearer("not-a-real-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}
