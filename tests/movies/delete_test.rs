use axum::http::StatusCode;
use axum_test::multipart::Part;
use serial_test::serial;

use crate::common::{create_movie, movie_form, register_user, TestContext};

#[tokio::test]
#[serial]
async fn delete_removes_record_and_blobs() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let jpeg = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
        .file_name("poster.jpg")
        .mime_type("image/jpeg");
    let create = ctx
        .server
        .post("/movies")
        .authorization_bearer(&user.token)
        .multipart(movie_form("Doomed", "2026-01-01").add_part("poster", jpeg))
        .await;
    create.assert_status(StatusCode::CREATED);
    let created: serde_json::Value = create.json();
    let id = created["id"].as_str().unwrap();
    let poster_url = created["posterUrl"].as_str().unwrap().to_string();

    let response = ctx
        .server
        .delete(&format!("/movies/{}", id))
        .authorization_bearer(&user.token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    ctx.server
        .get(&format!("/movies/{}", id))
        .authorization_bearer(&user.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    assert!(ctx.storage.deleted_urls().contains(&poster_url));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn delete_by_non_owner_returns_forbidden() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let owner = register_user(&ctx).await;
    let intruder = register_user(&ctx).await;

    let movie = create_movie(&ctx, &owner.token, "Keep Me", "2026-01-01").await;
    let id = movie["id"].as_str().unwrap();

    ctx.server
        .delete(&format!("/movies/{}", id))
        .authorization_bearer(&intruder.token)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies WHERE id = ?")
        .bind(id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn delete_unknown_movie_returns_not_found() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    ctx.server
        .delete("/movies/00000000-0000-0000-0000-000000000000")
        .authorization_bearer(&user.token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}
