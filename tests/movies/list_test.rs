use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use serial_test::serial;

use crate::common::{create_movie, register_user, TestContext};

async fn create_with_duration(ctx: &TestContext, token: &str, title: &str, duration: u32) {
    let form = MultipartForm::new()
        .add_text("title", title)
        .add_text("originalTitle", title)
        .add_text("releaseDate", "2026-01-01")
        .add_text("description", "A test movie with a long enough description.")
        .add_text("duration", duration.to_string());

    ctx.server
        .post("/movies")
        .authorization_bearer(token)
        .multipart(form)
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
#[serial]
async fn list_paginates_and_reports_totals() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    create_movie(&ctx, &user.token, "Movie A", "2026-01-01").await;
    create_movie(&ctx, &user.token, "Movie B", "2026-02-01").await;
    create_movie(&ctx, &user.token, "Movie C", "2026-03-01").await;

    let page1 = ctx
        .server
        .get("/movies")
        .authorization_bearer(&user.token)
        .add_query_param("page", "1")
        .add_query_param("limit", "2")
        .await;
    page1.assert_status(StatusCode::OK);
    let body1: serde_json::Value = page1.json();
    assert_eq!(body1["movies"].as_array().unwrap().len(), 2);
    assert_eq!(body1["pagination"]["total"].as_i64(), Some(3));
    assert_eq!(body1["pagination"]["totalPages"].as_i64(), Some(2));

    let page2 = ctx
        .server
        .get("/movies")
        .authorization_bearer(&user.token)
        .add_query_param("page", "2")
        .add_query_param("limit", "2")
        .await;
    let body2: serde_json::Value = page2.json();
    assert_eq!(body2["movies"].as_array().unwrap().len(), 1);

    // Items across all pages add up to the reported total
    let total_items =
        body1["movies"].as_array().unwrap().len() + body2["movies"].as_array().unwrap().len();
    assert_eq!(total_items as i64, body1["pagination"]["total"].as_i64().unwrap());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_orders_by_release_date_descending() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    create_movie(&ctx, &user.token, "Oldest", "2020-01-01").await;
    create_movie(&ctx, &user.token, "Newest", "2026-01-01").await;
    create_movie(&ctx, &user.token, "Middle", "2023-01-01").await;

    let response = ctx
        .server
        .get("/movies")
        .authorization_bearer(&user.token)
        .await;
    let body: serde_json::Value = response.json();
    let titles: Vec<&str> = body["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Newest", "Middle", "Oldest"]);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_filters_by_duration_range_inclusively() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    create_with_duration(&ctx, &user.token, "Short", 60).await;
    create_with_duration(&ctx, &user.token, "Lower Bound", 90).await;
    create_with_duration(&ctx, &user.token, "Upper Bound", 180).await;
    create_with_duration(&ctx, &user.token, "Long", 200).await;

    let response = ctx
        .server
        .get("/movies")
        .authorization_bearer(&user.token)
        .add_query_param("minDuration", "90")
        .add_query_param("maxDuration", "180")
        .await;
    let body: serde_json::Value = response.json();
    let titles: Vec<&str> = body["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Lower Bound"));
    assert!(titles.contains(&"Upper Bound"));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_search_matches_case_insensitively() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    create_movie(&ctx, &user.token, "Inception", "2010-07-16").await;
    create_movie(&ctx, &user.token, "Interstellar", "2014-11-07").await;

    let response = ctx
        .server
        .get("/movies")
        .authorization_bearer(&user.token)
        .add_query_param("search", "inCEPtion")
        .await;
    let body: serde_json::Value = response.json();
    let movies = body["movies"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"].as_str(), Some("Inception"));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_rejects_limit_over_cap() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let user = register_user(&ctx).await;

    let response = ctx
        .server
        .get("/movies")
        .authorization_bearer(&user.token)
        .add_query_param("limit", "51")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}
