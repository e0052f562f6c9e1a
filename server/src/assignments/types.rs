//! Assignment and Submission Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::db::SubmissionStatus;
use crate::storage::StorageError;

/// Assignment/submission error type.
#[derive(Debug, Error)]
pub enum AssignmentError {
    /// Assignment, submission, group or user missing.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The user already submitted to this assignment.
    #[error("You have already submitted for this assignment")]
    DuplicateSubmission,

    /// Caller is neither the owner nor an admin.
    #[error("Access denied")]
    Forbidden,

    /// Validation error.
    #[error("{0}")]
    Validation(String),

    /// Upload rejected or storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AssignmentError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::DuplicateSubmission => (StatusCode::CONFLICT, "DUPLICATE_SUBMISSION"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Storage(err) => return err.into_response(),
            Self::Database(ref err) => {
                tracing::error!(%err, "Assignment endpoint database error");
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

/// Create or replace an assignment.
#[derive(Debug, Deserialize, Validate)]
pub struct AssignmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub group_id: Uuid,
}

impl AssignmentRequest {
    pub fn check(&self) -> Result<(), AssignmentError> {
        self.validate()
            .map_err(|e| AssignmentError::Validation(format!("Validation failed: {e}")))?;
        if self.title.trim().is_empty() {
            return Err(AssignmentError::Validation("Title is required".to_string()));
        }
        Ok(())
    }
}

/// Grade a submission.
#[derive(Debug, Deserialize, Validate)]
pub struct EvaluationRequest {
    pub status: SubmissionStatus,
    pub grade: Option<f64>,
    #[validate(length(max = 2000))]
    pub feedback: Option<String>,
}

impl EvaluationRequest {
    pub fn check(&self) -> Result<(), AssignmentError> {
        self.validate()
            .map_err(|e| AssignmentError::Validation(format!("Validation failed: {e}")))?;
        if let Some(grade) = self.grade {
            if !grade.is_finite() || !(0.0..=100.0).contains(&grade) {
                return Err(AssignmentError::Validation(
                    "Grade must be between 0 and 100".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Render a grade for the review email.
pub fn display_grade(grade: Option<f64>) -> String {
    grade.map_or_else(|| "N/A".to_string(), |g| format!("{g}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(grade: Option<f64>) -> EvaluationRequest {
        EvaluationRequest {
            status: SubmissionStatus::Graded,
            grade,
            feedback: None,
        }
    }

    #[test]
    fn test_grade_bounds() {
        assert!(evaluation(None).check().is_ok());
        assert!(evaluation(Some(0.0)).check().is_ok());
        assert!(evaluation(Some(85.5)).check().is_ok());
        assert!(evaluation(Some(100.0)).check().is_ok());
        assert!(evaluation(Some(150.0)).check().is_err());
        assert!(evaluation(Some(-0.5)).check().is_err());
        assert!(evaluation(Some(f64::NAN)).check().is_err());
        assert!(evaluation(Some(f64::INFINITY)).check().is_err());
    }

    #[test]
    fn test_feedback_length() {
        let request = EvaluationRequest {
            status: SubmissionStatus::Rejected,
            grade: None,
            feedback: Some("f".repeat(2001)),
        };
        assert!(request.check().is_err());
    }

    #[test]
    fn test_status_wire_format() {
        let request: EvaluationRequest =
            serde_json::from_str(r#"{"status":"UNDER_REVIEW"}"#).unwrap();
        assert_eq!(request.status, SubmissionStatus::UnderReview);
    }

    #[test]
    fn test_display_grade() {
        assert_eq!(display_grade(Some(85.5)), "85.5");
        assert_eq!(display_grade(Some(90.0)), "90");
        assert_eq!(display_grade(None), "N/A");
    }

    #[test]
    fn test_assignment_title_required() {
        let request: AssignmentRequest = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "group_id": Uuid::now_v7(),
        }))
        .unwrap();
        assert!(matches!(request.check(), Err(AssignmentError::Validation(_))));
    }
}
