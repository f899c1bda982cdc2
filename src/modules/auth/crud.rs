use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool};

use crate::modules::auth::model::User;
use crate::services::{hashing, jwt::JwtService};

// =============================================================================
// AUTH ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already in use")]
    EmailExists,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(String),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::EmailExists => StatusCode::CONFLICT,
            Self::InvalidResetToken => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Hashing(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// MySQL signals a violated unique index with error 1062. The pre-check in
/// the register flow is only a fast path; this is the actual enforcement.
pub fn is_duplicate_entry(err: &sqlx::Error) -> bool {
    let msg = err.to_string();
    msg.contains("Duplicate entry") || msg.contains("1062")
}

pub struct LoginResult {
    pub user: User,
    pub token: String,
}

// =============================================================================
// USER CRUD
// =============================================================================

pub struct UserCrud<'a> {
    pool: Pool<MySql>,
    jwt_service: &'a JwtService,
}

impl<'a> UserCrud<'a> {
    pub fn new(pool: Pool<MySql>, jwt_service: &'a JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn create(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, reset_token, reset_token_expires, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.reset_token)
        .bind(user.reset_token_expires)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .jwt_service
            .create_token(&user.id, &user.email)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        Ok(LoginResult { user, token })
    }

    pub async fn set_reset_token(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = ?, reset_token_expires = ?, updated_at = ? WHERE id = ?",
        )
        .bind(token)
        .bind(expires_at)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE reset_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    /// Set the new password hash and clear the reset token in one update.
    pub async fn apply_password_reset(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, reset_token = NULL, reset_token_expires = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
