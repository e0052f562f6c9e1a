//! Submission Downloads

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::handlers::AssignmentResult;
use super::submissions::visible_submission;
use crate::api::AppState;
use crate::auth::AuthUser;

/// Stream a submitted file to its owner or an admin.
///
/// GET /api/files/submissions/{id}/download
#[tracing::instrument(skip(state), fields(user_id = %auth.id, submission_id = %id))]
pub async fn download_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AssignmentResult<Response> {
    let submission = visible_submission(&state, &auth, id).await?;

    let (file, len) = state.storage.open(&submission.file_path).await?;

    let content_type = mime_guess::from_path(&submission.file_name)
        .first_or_octet_stream()
        .to_string();

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", submission.file_name),
        ),
        (
            HeaderName::from_static("x-content-type-options"),
            "nosniff".to_string(),
        ),
    ];

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((headers, body).into_response())
}
