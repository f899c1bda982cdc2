use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serial_test::serial;

use crate::common::{create_movie, movie_form, register_user, TestContext};

fn jpeg_part() -> Part {
    Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
        .file_name("poster.jpg")
        .mime_type("image/jpeg")
}

#[tokio::test]
#[serial]
async fn create_movie_returns_created_with_owner() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let body = create_movie(&ctx, &user.token, "Inception", "2010-07-16").await;

    assert_eq!(body["title"].as_str(), Some("Inception"));
    assert_eq!(body["duration"].as_i64(), Some(120));
    assert_eq!(body["reminderSent"].as_bool(), Some(false));
    assert_eq!(body["owner"]["email"].as_str(), Some(user.email.as_str()));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_movie_with_poster_uploads_blob() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let form = movie_form("Poster Movie", "2026-01-01").add_part("poster", jpeg_part());
    let response = ctx
        .server
        .post("/movies")
        .authorization_bearer(&user.token)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    let poster_url = body["posterUrl"].as_str().expect("poster url");
    assert!(poster_url.contains("posters/"));

    let keys = ctx.storage.uploaded_keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("posters/"));
    assert!(keys[0].ends_with(".jpg"));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_movie_rejects_missing_title() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let form = MultipartForm::new()
        .add_text("originalTitle", "No Title")
        .add_text("releaseDate", "2026-01-01")
        .add_text("description", "A movie without its required title field.")
        .add_text("duration", "90");

    let response = ctx
        .server
        .post("/movies")
        .authorization_bearer(&user.token)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_movie_rejects_disallowed_image_type() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let pdf = Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("poster.pdf")
        .mime_type("application/pdf");
    let form = movie_form("Bad Image", "2026-01-01").add_part("poster", pdf);

    let response = ctx
        .server
        .post("/movies")
        .authorization_bearer(&user.token)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(ctx.storage.uploaded_keys().is_empty());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_movie_requires_auth() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let response = ctx
        .server
        .post("/movies")
        .multipart(movie_form("Nope", "2026-01-01"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}
