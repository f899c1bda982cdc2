use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::modules::auth::{
    crud::{is_duplicate_entry, AuthError, UserCrud},
    extractor::AuthUser,
    model::User,
    schema::{
        AuthResponse, ErrorResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
        RegisterRequest, ResetPasswordRequest, ResetPasswordResponse, UserResponse,
    },
};
use crate::services::{hashing, mailer};
use crate::AppState;

const RESET_TOKEN_TTL_HOURS: i64 = 1;

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let email = req.email.trim().to_lowercase();
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    // Fast path; the unique index on users.email is the real guarantee
    if crud.email_exists(&email).await.map_err(internal)? {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Email already in use")),
        ));
    }

    let password_hash = hashing::hash_password(&req.password).map_err(internal)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email,
        password_hash,
        reset_token: None,
        reset_token_expires: None,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = crud.create(&user).await {
        if is_duplicate_entry(&e) {
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("Email already in use")),
            ));
        }
        return Err(internal(e));
    }

    let token = state
        .jwt_service
        .create_token(&user.id, &user.email)
        .map_err(internal)?;

    tracing::info!("user {} registered", user.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    let email = req.email.trim().to_lowercase();
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let result = crud.login(&email, &req.password).await.map_err(|e| match e {
        // Unknown email and wrong password produce the same body on purpose
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid email or password")),
        ),
        other => internal(other),
    })?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(result.user),
        token: result.token,
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let user = crud
        .find_by_id(&auth.id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("User not found")),
        ))?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let email = req.email.trim().to_lowercase();
    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    let user = crud
        .find_by_email(&email)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("User not found")),
        ))?;

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

    crud.set_reset_token(&user.id, &token, expires_at)
        .await
        .map_err(internal)?;

    // The confirmation does not depend on delivery succeeding
    let (subject, html) = mailer::password_reset_email(&token, state.frontend_url.as_deref());
    if let Err(e) = state.mailer.send(&user.email, &subject, html).await {
        tracing::warn!("password reset email to {} failed: {}", user.email, e);
    }

    Ok(Json(ForgotPasswordResponse {
        message: "Password reset instructions sent",
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = UserCrud::new(state.db.clone(), &state.jwt_service);

    // Unknown token and expired token are indistinguishable to the caller
    let invalid = || {
        (
            AuthError::InvalidResetToken.status_code(),
            Json(ErrorResponse::new(AuthError::InvalidResetToken.to_string())),
        )
    };

    let user = crud
        .find_by_reset_token(&req.token)
        .await
        .map_err(internal)?
        .ok_or_else(invalid)?;

    match user.reset_token_expires {
        Some(expires) if expires > Utc::now() => {}
        _ => return Err(invalid()),
    }

    let password_hash = hashing::hash_password(&req.password).map_err(internal)?;

    crud.apply_password_reset(&user.id, &password_hash)
        .await
        .map_err(internal)?;

    tracing::info!("password reset for user {}", user.id);
    Ok(Json(ResetPasswordResponse {
        message: "Password has been reset",
    }))
}
