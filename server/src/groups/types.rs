//! Group Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Group error type.
#[derive(Debug, Error)]
pub enum GroupError {
    /// Group not found.
    #[error("Group not found")]
    GroupNotFound,

    /// User not found.
    #[error("User not found")]
    UserNotFound,

    /// Another group already uses the name.
    #[error("Group with name '{0}' already exists")]
    DuplicateName(String),

    /// Validation error.
    #[error("{0}")]
    Validation(String),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for GroupError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::GroupNotFound | Self::UserNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::DuplicateName(_) => (StatusCode::CONFLICT, "GROUP_EXISTS"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Database(err) => {
                tracing::error!(%err, "Group endpoint database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": code, "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Create or update a group.
///
/// On update, `user_ids` replaces the membership when present (even if
/// empty) and leaves it untouched when absent.
#[derive(Debug, Deserialize, Validate)]
pub struct GroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 200))]
    pub description: Option<String>,
    pub user_ids: Option<Vec<Uuid>>,
}

impl GroupRequest {
    pub fn check(&self) -> Result<(), GroupError> {
        self.validate()
            .map_err(|e| GroupError::Validation(format!("Validation failed: {e}")))?;
        if self.name.trim().is_empty() {
            return Err(GroupError::Validation("Group name is required".to_string()));
        }
        Ok(())
    }

    /// Requested member ids without duplicates, in request order.
    pub fn unique_user_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::new();
        for id in self.user_ids.iter().flatten() {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}
