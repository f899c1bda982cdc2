use axum::{routing::get, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/profile",
        get(controller::get_profile).put(controller::update_profile),
    )
}
