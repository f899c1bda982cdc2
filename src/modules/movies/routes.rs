use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn movie_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(controller::list).post(controller::create))
        .route(
            "/{id}",
            get(controller::get_by_id)
                .put(controller::update)
                .delete(controller::remove),
        )
        // Two images at 5MB each plus the text fields
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
}
