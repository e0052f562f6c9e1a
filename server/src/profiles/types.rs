//! Profile Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::db::UserDetails;
use crate::storage::StorageError;

/// Profile error type.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No profile (or no user) for the requested id.
    #[error("User profile not found")]
    NotFound,

    /// The caller already has a profile.
    #[error("User profile already exists")]
    AlreadyExists,

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Upload rejected or storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            Self::AlreadyExists => (StatusCode::CONFLICT, "PROFILE_EXISTS", self.to_string()),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.to_string()),
            Self::Storage(err) => return err.into_response(),
            Self::Database(err) => {
                tracing::error!(%err, "Profile endpoint database error");
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

/// Uploadable profile document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Resume,
    Ead,
    Id,
}

impl DocumentType {
    /// Directory name under the user's profile folder.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::Ead => "ead",
            Self::Id => "id",
        }
    }

    /// Accepted file extensions.
    pub const fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Resume => &["pdf", "doc", "docx"],
            Self::Ead | Self::Id => &["pdf", "jpg", "jpeg", "png"],
        }
    }

    /// The profile column holding this document's path.
    pub fn slot(self, details: &mut UserDetails) -> &mut Option<String> {
        match self {
            Self::Resume => &mut details.resume_path,
            Self::Ead => &mut details.ead_path,
            Self::Id => &mut details.id_document_path,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Profile fields as submitted by the client.
///
/// On create `first_name` and `last_name` are required; on update every
/// absent field is left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 500))]
    pub referral_source: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub ead_type: Option<String>,
    pub ead_start_date: Option<NaiveDate>,
    pub prior_experience: Option<bool>,
    #[validate(length(max = 5000))]
    pub experience_details: Option<String>,
    #[validate(length(max = 1000))]
    pub programming_languages: Option<String>,
}

impl ProfileRequest {
    /// Field validation plus the date-of-birth check.
    pub fn check(&self) -> Result<(), ProfileError> {
        self.validate()
            .map_err(|e| ProfileError::Validation(e.to_string()))?;
        if let Some(dob) = self.date_of_birth {
            if dob >= Utc::now().date_naive() {
                return Err(ProfileError::Validation(
                    "date_of_birth must be in the past".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Overwrite the fields present in this request.
    pub fn apply_to(self, details: &mut UserDetails) {
        if let Some(v) = self.first_name {
            details.first_name = v;
        }
        if let Some(v) = self.last_name {
            details.last_name = v;
        }
        if self.referral_source.is_some() {
            details.referral_source = self.referral_source;
        }
        if self.date_of_birth.is_some() {
            details.date_of_birth = self.date_of_birth;
        }
        if self.ead_type.is_some() {
            details.ead_type = self.ead_type;
        }
        if self.ead_start_date.is_some() {
            details.ead_start_date = self.ead_start_date;
        }
        if let Some(v) = self.prior_experience {
            details.prior_experience = v;
        }
        if self.experience_details.is_some() {
            details.experience_details = self.experience_details;
        }
        if self.programming_languages.is_some() {
            details.programming_languages = self.programming_languages;
        }
        details.profile_completed = details.is_complete();
    }
}

/// Empty profile for a user, before any request fields are applied.
pub fn blank_profile(user_id: Uuid) -> UserDetails {
    let now = Utc::now();
    UserDetails {
        id: Uuid::now_v7(),
        user_id,
        first_name: String::new(),
        last_name: String::new(),
        referral_source: None,
        date_of_birth: None,
        ead_type: None,
        ead_start_date: None,
        prior_experience: false,
        experience_details: None,
        programming_languages: None,
        resume_path: None,
        ead_path: None,
        id_document_path: None,
        profile_completed: false,
        created_at: now,
        updated_at: now,
    }
}

/// Profile with its completion percentage.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub details: UserDetails,
    pub completion_percentage: u8,
}

impl From<UserDetails> for ProfileResponse {
    fn from(details: UserDetails) -> Self {
        let completion_percentage = details.completion_percentage();
        Self {
            details,
            completion_percentage,
        }
    }
}

/// Profile completion summary.
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub user_id: Uuid,
    pub completion_percentage: u8,
    pub is_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_document_type_allow_lists() {
        assert!(DocumentType::Resume.allowed_extensions().contains(&"docx"));
        assert!(!DocumentType::Resume.allowed_extensions().contains(&"png"));
        assert!(DocumentType::Id.allowed_extensions().contains(&"jpeg"));
        assert!(!DocumentType::Ead.allowed_extensions().contains(&"doc"));
    }

    #[test]
    fn test_document_type_from_path_segment() {
        let parsed: DocumentType = serde_json::from_str("\"ead\"").unwrap();
        assert_eq!(parsed, DocumentType::Ead);
        assert!(serde_json::from_str::<DocumentType>("\"passport\"").is_err());
    }

    #[test]
    fn test_date_of_birth_must_be_past() {
        let today = Utc::now().date_naive();
        let future = ProfileRequest {
            date_of_birth: Some(today + Duration::days(1)),
            ..ProfileRequest::default()
        };
        assert!(matches!(future.check(), Err(ProfileError::Validation(_))));

        let past = ProfileRequest {
            date_of_birth: Some(today - Duration::days(365 * 20)),
            ..ProfileRequest::default()
        };
        assert!(past.check().is_ok());
    }

    #[test]
    fn test_field_lengths() {
        let long_name = ProfileRequest {
            first_name: Some("x".repeat(101)),
            ..ProfileRequest::default()
        };
        assert!(long_name.check().is_err());

        let empty_name = ProfileRequest {
            last_name: Some(String::new()),
            ..ProfileRequest::default()
        };
        assert!(empty_name.check().is_err());
    }

    #[test]
    fn test_apply_keeps_absent_fields_and_recomputes_completion() {
        let mut details = blank_profile(Uuid::now_v7());
        details.ead_type = Some("C09".into());

        ProfileRequest {
            first_name: Some("Alice".into()),
            prior_experience: Some(true),
            ..ProfileRequest::default()
        }
        .apply_to(&mut details);

        assert_eq!(details.first_name, "Alice");
        assert_eq!(details.ead_type.as_deref(), Some("C09"));
        assert!(details.prior_experience);
        assert!(!details.profile_completed);
    }
}
