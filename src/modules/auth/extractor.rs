use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use std::sync::Arc;

use super::schema::ErrorResponse;
use crate::AppState;

/// Verified bearer-token identity, attached to protected handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

fn unauthorized(msg: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(msg)))
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Token not provided"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid authorization header"))?;

        let data = state
            .jwt_service
            .verify_token(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}
