//! Chat Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Chat error type.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Sender, receiver, admin or group missing.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller may not post into or read the group.
    #[error("You are not a member of this group")]
    Forbidden,

    /// Validation error.
    #[error("{0}")]
    Validation(String),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Database(err) => {
                tracing::error!(%err, "Chat endpoint database error");
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

/// Send a message.
///
/// Without `group_id` the message is direct: a USER always writes to the
/// admin, an ADMIN must name the `receiver_id`. With `group_id` the message
/// goes to the group and `receiver_id` is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

impl SendMessageRequest {
    pub fn check(&self) -> Result<(), ChatError> {
        self.validate()
            .map_err(|e| ChatError::Validation(format!("Validation failed: {e}")))?;
        if self.content.trim().is_empty() {
            return Err(ChatError::Validation("Message content is required".to_string()));
        }
        Ok(())
    }
}
