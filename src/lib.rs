pub mod config;
pub mod modules;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::DbPool;
use modules::auth::auth_routes;
use modules::movies::movie_routes;
use modules::users::user_routes;
use services::jwt::JwtService;
use services::mailer::Mailer;
use services::storage::ObjectStorage;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub storage: Arc<dyn ObjectStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub frontend_url: Option<String>,
}

pub async fn create_app(
    db: DbPool,
    jwt_service: JwtService,
    storage: Arc<dyn ObjectStorage>,
    mailer: Arc<dyn Mailer>,
    frontend_url: Option<String>,
) -> Router {
    let cors = cors_layer(frontend_url.as_deref());

    let state = Arc::new(AppState {
        db,
        jwt_service,
        storage,
        mailer,
        frontend_url,
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/movies", movie_routes())
        .nest("/users", user_routes())
        .layer(RequestBodyLimitLayer::new(12 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Lock CORS to the configured frontend origin; stay permissive when no
/// origin is configured (local development).
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    match frontend_url.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::permissive(),
    }
}

async fn root() -> &'static str {
    "Cinevault API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
    })
}
