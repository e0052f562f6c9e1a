//! Database Models

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Claim value carried in access tokens.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::User => "USER",
        }
    }

    /// Parse a role claim. Unknown values yield `None`.
    pub fn from_claim(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Self::Admin),
            "USER" => Some(Self::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Onboarding,
    Active,
    Inactive,
    Suspended,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Onboarding => "ONBOARDING",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Suspended => "SUSPENDED",
        })
    }
}

/// Grading state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    UnderReview,
    Graded,
    Rejected,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Graded => "GRADED",
            Self::Rejected => "REJECTED",
        })
    }
}

/// User model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User joined with their group membership, as returned by the API.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal user projection (id, username, email).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BasicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Group model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Group with its member ids.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub member_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat message. Exactly one of `receiver_id` / `group_id` is set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Assignment with group name, creator and submission count.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub group_id: Uuid,
    pub group_name: String,
    pub created_by: Uuid,
    pub created_by_username: String,
    pub submission_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission with assignment title and submitter username.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub assignment_title: String,
    pub user_id: Uuid,
    pub username: String,
    /// Path relative to the upload root.
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub status: SubmissionStatus,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Onboarding profile, one per user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub referral_source: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub ead_type: Option<String>,
    pub ead_start_date: Option<NaiveDate>,
    pub prior_experience: bool,
    pub experience_details: Option<String>,
    pub programming_languages: Option<String>,
    pub resume_path: Option<String>,
    pub ead_path: Option<String>,
    pub id_document_path: Option<String>,
    pub profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Number of profile fields tracked for completion.
pub const PROFILE_TRACKED_FIELDS: u32 = 9;

fn filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

impl UserDetails {
    /// Percentage (0-100, rounded) of the nine tracked fields that are filled.
    pub fn completion_percentage(&self) -> u8 {
        let tracked = [
            filled(Some(&self.first_name)),
            filled(Some(&self.last_name)),
            filled(self.referral_source.as_deref()),
            self.date_of_birth.is_some(),
            filled(self.ead_type.as_deref()),
            self.ead_start_date.is_some(),
            filled(self.resume_path.as_deref()),
            filled(self.ead_path.as_deref()),
            filled(self.id_document_path.as_deref()),
        ];
        let count = tracked.iter().filter(|f| **f).count() as u32;
        ((f64::from(count) * 100.0) / f64::from(PROFILE_TRACKED_FIELDS)).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.completion_percentage() == 100
    }
}
