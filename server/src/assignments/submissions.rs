//! Submission Handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::AssignmentResult;
use super::types::{display_grade, AssignmentError, EvaluationRequest};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, Submission};
use crate::email::{EmailType, Notification};

/// Parsed `POST /api/submissions` form.
struct SubmissionUpload {
    assignment_id: Uuid,
    file_name: String,
    data: Vec<u8>,
}

async fn read_submission_form(mut multipart: Multipart) -> AssignmentResult<SubmissionUpload> {
    let mut assignment_id: Option<Uuid> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(String::from).unwrap_or_default();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AssignmentError::Validation(e.to_string()))?;
                file = Some((file_name, data.to_vec()));
            }
            "assignment_id" | "assignmentId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AssignmentError::Validation(e.to_string()))?;
                assignment_id = Some(text.trim().parse().map_err(|_| {
                    AssignmentError::Validation("Invalid assignment_id".to_string())
                })?);
            }
            _ => {}
        }
    }

    let assignment_id = assignment_id
        .ok_or_else(|| AssignmentError::Validation("assignment_id is required".to_string()))?;
    let (file_name, data) =
        file.ok_or_else(|| AssignmentError::Validation("file is required".to_string()))?;

    Ok(SubmissionUpload {
        assignment_id,
        file_name,
        data,
    })
}

/// Submit a file for an assignment.
///
/// POST /api/submissions
///
/// Multipart form with `assignment_id` and `file`.
#[tracing::instrument(skip(state, multipart), fields(user_id = %auth.id))]
pub async fn create_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AssignmentResult<(StatusCode, Json<Submission>)> {
    let upload = read_submission_form(multipart).await?;

    let user = db::find_basic_user(&state.db, auth.id)
        .await?
        .ok_or(AssignmentError::NotFound("User"))?;
    let assignment = db::find_assignment(&state.db, upload.assignment_id)
        .await?
        .ok_or(AssignmentError::NotFound("Assignment"))?;

    if db::submission_exists(&state.db, assignment.id, user.id).await? {
        return Err(AssignmentError::DuplicateSubmission);
    }

    let stored = state
        .storage
        .store_submission(assignment.id, user.id, &upload.file_name, &upload.data)
        .await?;

    let result = async {
        let mut tx = state.db.begin().await?;
        let submission = db::create_submission(
            &mut *tx,
            assignment.id,
            user.id,
            &stored.relative_path,
            &stored.file_name,
            i64::try_from(stored.size).unwrap_or(i64::MAX),
        )
        .await?;
        let admins = db::list_admins(&mut *tx).await?;
        tx.commit().await?;
        Ok::<_, sqlx::Error>((submission, admins))
    }
    .await;

    let (submission, admins) = match result {
        Ok(ok) => ok,
        Err(e) => {
            state.storage.remove_quietly(&stored.relative_path).await;
            if db::is_unique_violation(&e) {
                return Err(AssignmentError::DuplicateSubmission);
            }
            return Err(e.into());
        }
    };

    state.notifier.notify_all(admins.into_iter().map(|admin| {
        Notification::new(
            admin.email,
            EmailType::Submission,
            [submission.assignment_title.as_str(), user.username.as_str()],
        )
    }));

    tracing::info!(
        submission_id = %submission.id,
        assignment_id = %assignment.id,
        size = stored.size,
        "Submission received"
    );

    Ok((StatusCode::CREATED, Json(submission)))
}

/// The caller's submissions, newest first.
///
/// GET /api/submissions/my
pub async fn list_my_submissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AssignmentResult<Json<Vec<Submission>>> {
    Ok(Json(db::list_submissions_for_user(&state.db, auth.id).await?))
}

/// Load a submission the caller may see: their own, or any for an admin.
pub(crate) async fn visible_submission(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> AssignmentResult<Submission> {
    let submission = db::find_submission(&state.db, id)
        .await?
        .ok_or(AssignmentError::NotFound("Submission"))?;
    if submission.user_id != auth.id && !auth.is_admin() {
        return Err(AssignmentError::Forbidden);
    }
    Ok(submission)
}

/// Get a submission.
///
/// GET /api/submissions/{id}
pub async fn get_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AssignmentResult<Json<Submission>> {
    Ok(Json(visible_submission(&state, &auth, id).await?))
}

/// Grade a submission.
///
/// PUT /api/submissions/{id}/evaluation
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, submission_id = %id))]
pub async fn evaluate_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<EvaluationRequest>,
) -> AssignmentResult<Json<Submission>> {
    body.check()?;

    let mut tx = state.db.begin().await?;

    let submission = db::evaluate_submission(
        &mut *tx,
        id,
        body.status,
        body.grade,
        body.feedback.as_deref(),
    )
    .await?
    .ok_or(AssignmentError::NotFound("Submission"))?;
    let student = db::find_basic_user(&mut *tx, submission.user_id)
        .await?
        .ok_or(AssignmentError::NotFound("User"))?;

    tx.commit().await?;

    state.notifier.notify(Notification::new(
        student.email,
        EmailType::SubmissionReview,
        [
            submission.assignment_title.clone(),
            display_grade(submission.grade),
            submission.feedback.clone().unwrap_or_default(),
        ],
    ));

    tracing::info!(status = %submission.status, grade = ?submission.grade, "Submission evaluated");

    Ok(Json(submission))
}
