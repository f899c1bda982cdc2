use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    crud::is_duplicate_entry,
    schema::{ErrorResponse, UserResponse},
    AuthUser,
};
use crate::modules::users::{crud::ProfileCrud, schema::UpdateProfileRequest};
use crate::services::hashing;
use crate::AppState;

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}

fn user_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("User not found")),
    )
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let crud = ProfileCrud::new(state.db.clone());

    let user = crud
        .find_by_id(&auth.id)
        .await
        .map_err(internal)?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    let crud = ProfileCrud::new(state.db.clone());

    let user = crud
        .find_by_id(&auth.id)
        .await
        .map_err(internal)?
        .ok_or_else(user_not_found)?;

    let new_email = match &req.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if email != user.email {
                if crud
                    .email_taken_by_other(&email, &user.id)
                    .await
                    .map_err(internal)?
                {
                    return Err((
                        StatusCode::CONFLICT,
                        Json(ErrorResponse::new("Email already in use")),
                    ));
                }
                Some(email)
            } else {
                None
            }
        }
        None => None,
    };

    let password_hash = match (&req.new_password, &req.current_password) {
        (Some(new_password), Some(current)) => {
            let matches = hashing::verify_password(current, &user.password_hash)
                .map_err(internal)?;
            if !matches {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Current password is incorrect")),
                ));
            }
            Some(hashing::hash_password(new_password).map_err(internal)?)
        }
        (Some(_), None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "Current password is required to change password",
                )),
            ));
        }
        _ => None,
    };

    if let Err(e) = crud
        .update(
            &user.id,
            req.name.as_deref().map(str::trim),
            new_email.as_deref(),
            password_hash.as_deref(),
        )
        .await
    {
        // The unique index is authoritative even after the pre-check
        if is_duplicate_entry(&e) {
            return Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("Email already in use")),
            ));
        }
        return Err(internal(e));
    }

    let updated = crud
        .find_by_id(&user.id)
        .await
        .map_err(internal)?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserResponse::from(updated)))
}
