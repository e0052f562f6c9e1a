//! Assignment Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::types::{AssignmentError, AssignmentRequest};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, Assignment, Submission};
use crate::util::non_blank;

pub(crate) type AssignmentResult<T> = Result<T, AssignmentError>;

/// Create an assignment for a group.
///
/// POST /api/assignments
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, group_id = %body.group_id))]
pub async fn create_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AssignmentRequest>,
) -> AssignmentResult<(StatusCode, Json<Assignment>)> {
    body.check()?;
    let description = non_blank(body.description);

    let mut tx = state.db.begin().await?;

    if db::find_basic_user(&mut *tx, auth.id).await?.is_none() {
        return Err(AssignmentError::NotFound("User"));
    }
    if db::find_group_by_id(&mut *tx, body.group_id).await?.is_none() {
        return Err(AssignmentError::NotFound("Group"));
    }

    let assignment = db::create_assignment(
        &mut *tx,
        body.title.trim(),
        description.as_deref(),
        body.due_date,
        body.group_id,
        auth.id,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(assignment_id = %assignment.id, "Assignment created");

    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Assignments of the caller's group; empty when the caller has no group.
///
/// GET /api/assignments
pub async fn list_my_assignments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AssignmentResult<Json<Vec<Assignment>>> {
    let Some(group_id) = db::find_user_group_id(&state.db, auth.id).await? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(db::list_assignments_for_group(&state.db, group_id).await?))
}

/// Every assignment, newest first.
///
/// GET /api/assignments/all
pub async fn list_all_assignments(
    State(state): State<AppState>,
) -> AssignmentResult<Json<Vec<Assignment>>> {
    Ok(Json(db::list_all_assignments(&state.db).await?))
}

/// Get an assignment.
///
/// GET /api/assignments/{id}
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AssignmentResult<Json<Assignment>> {
    let assignment = db::find_assignment(&state.db, id)
        .await?
        .ok_or(AssignmentError::NotFound("Assignment"))?;
    Ok(Json(assignment))
}

/// Replace the editable fields of an assignment.
///
/// PUT /api/assignments/{id}
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, assignment_id = %id))]
pub async fn update_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignmentRequest>,
) -> AssignmentResult<Json<Assignment>> {
    body.check()?;
    let description = non_blank(body.description);

    let mut tx = state.db.begin().await?;

    if db::find_group_by_id(&mut *tx, body.group_id).await?.is_none() {
        return Err(AssignmentError::NotFound("Group"));
    }

    let assignment = db::update_assignment(
        &mut *tx,
        id,
        body.title.trim(),
        description.as_deref(),
        body.due_date,
        body.group_id,
    )
    .await?
    .ok_or(AssignmentError::NotFound("Assignment"))?;
    tx.commit().await?;

    Ok(Json(assignment))
}

/// Delete an assignment together with its submissions and their files.
///
/// DELETE /api/assignments/{id}
#[tracing::instrument(skip(state), fields(admin_id = %auth.id, assignment_id = %id))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AssignmentResult<StatusCode> {
    if db::delete_assignment(&state.db, id).await? == 0 {
        return Err(AssignmentError::NotFound("Assignment"));
    }
    state.storage.remove_assignment_files(id).await;

    tracing::info!("Assignment deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Submissions for an assignment, newest first.
///
/// GET /api/assignments/{id}/submissions
/// GET /api/submissions/assignment/{id}
pub async fn list_assignment_submissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AssignmentResult<Json<Vec<Submission>>> {
    if db::find_assignment(&state.db, id).await?.is_none() {
        return Err(AssignmentError::NotFound("Assignment"));
    }
    Ok(Json(
        db::list_submissions_for_assignment(&state.db, id).await?,
    ))
}
