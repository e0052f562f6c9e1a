//! User Management Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::db::{AccountStatus, Role};
use crate::util::USERNAME_REGEX;

/// User management error type.
#[derive(Debug, Error)]
pub enum UserError {
    /// Referenced user does not exist.
    #[error("User not found")]
    NotFound,

    /// Username or email collides with another account.
    #[error("Username or email already taken")]
    DuplicateIdentity,

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            Self::DuplicateIdentity => (StatusCode::CONFLICT, "USER_EXISTS", self.to_string()),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string()),
            Self::Database(err) => {
                tracing::error!(%err, "User endpoint database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Database error".to_string(),
                )
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": code, "message": message })),
        )
            .into_response()
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Admin update of an account. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 32), regex(path = *USERNAME_REGEX))]
    pub username: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    /// Reason included in the status-change email.
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Status change request.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    pub status: AccountStatus,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Reminder email request.
#[derive(Debug, Deserialize, Validate)]
pub struct ReminderRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

/// Response for queued notifications.
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}
