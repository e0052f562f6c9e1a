//! Authentication HTTP Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::{AuthError, AuthResult};
use super::jwt::{generate_access_token, ACCESS_TOKEN_TTL_SECONDS};
use super::middleware::AuthUser;
use super::password::{hash_password, verify_password};
use crate::api::AppState;
use crate::db::{
    self, email_exists, find_user_by_username, find_user_view, username_exists, AccountStatus,
    Role, UserView,
};
use crate::email::{EmailType, Notification};
use crate::util::USERNAME_REGEX;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username (3-32 of letters, digits, `_`, `.`, `-`).
    #[validate(length(min = 3, max = 32), regex(path = *USERNAME_REGEX))]
    pub username: String,
    /// Email address.
    #[validate(email, length(max = 255))]
    pub email: String,
    /// Password (8-128 characters).
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authentication response with the access token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token.
    pub token: String,
    /// Token type (always "Bearer").
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    /// The authenticated user.
    pub user: UserView,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account.
///
/// POST /auth/register
#[tracing::instrument(skip(state, body), fields(username = %body.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)> {
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let email = body.email.trim().to_lowercase();

    // UNIQUE constraints catch races between these checks and the insert
    if username_exists(&state.db, &body.username).await? {
        return Err(AuthError::UserAlreadyExists);
    }
    if email_exists(&state.db, &email).await? {
        return Err(AuthError::UserAlreadyExists);
    }

    let password_hash = hash_password(&body.password).map_err(|_| AuthError::PasswordHash)?;

    let user = db::create_user(
        &state.db,
        &body.username,
        &email,
        &password_hash,
        Role::User,
        AccountStatus::Onboarding,
    )
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            AuthError::UserAlreadyExists
        } else {
            AuthError::Database(e)
        }
    })?;

    let token = generate_access_token(user.id, user.role, &state.config.jwt_secret)?;

    state.notifier.notify(Notification::new(
        &user.email,
        EmailType::Registration,
        [user.username.as_str()],
    ));

    tracing::info!(user_id = %user.id, "User registered");

    let view = find_user_view(&state.db, user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            token_type: "Bearer",
            expires_in: ACCESS_TOKEN_TTL_SECONDS,
            user: view,
        }),
    ))
}

/// Login with username/password.
///
/// POST /auth/login
#[tracing::instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AuthResult<Json<AuthResponse>> {
    let user = find_user_by_username(&state.db, &body.username)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let valid =
        verify_password(&body.password, &user.password_hash).map_err(|_| AuthError::PasswordHash)?;
    if !valid {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_access_token(user.id, user.role, &state.config.jwt_secret)?;
    let view = find_user_view(&state.db, user.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: ACCESS_TOKEN_TTL_SECONDS,
        user: view,
    }))
}

/// Current user.
///
/// GET /auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AuthResult<Json<UserView>> {
    let user = find_user_view(&state.db, auth.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    Ok(Json(user))
}
