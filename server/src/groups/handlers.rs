//! Group Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgConnection;
use uuid::Uuid;

use super::types::{GroupError, GroupRequest};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, GroupView, UserView};
use crate::email::{EmailType, Notification};
use crate::util::non_blank;

type GroupResult<T> = Result<T, GroupError>;

/// Fallback signature when the acting admin cannot be resolved.
const DEFAULT_ACTOR: &str = "System Administrator";

async fn actor_name(conn: &mut PgConnection, id: Uuid) -> GroupResult<String> {
    Ok(db::find_basic_user(conn, id)
        .await?
        .map_or_else(|| DEFAULT_ACTOR.to_string(), |u| u.username))
}

fn map_duplicate(name: &str) -> impl FnOnce(sqlx::Error) -> GroupError + '_ {
    move |e| {
        if db::is_unique_violation(&e) {
            GroupError::DuplicateName(name.to_string())
        } else {
            GroupError::Database(e)
        }
    }
}

/// Attach each existing user to the group. Unknown ids are skipped.
///
/// Returns a GROUP_ASSIGNMENT notification for every user that was not
/// already a member of this group.
async fn attach_members(
    conn: &mut PgConnection,
    group_id: Uuid,
    group_name: &str,
    user_ids: &[Uuid],
    actor: &str,
) -> GroupResult<Vec<Notification>> {
    let mut notifications = Vec::new();
    for &user_id in user_ids {
        let Some(user) = db::find_basic_user(&mut *conn, user_id).await? else {
            tracing::debug!(user_id = %user_id, "Skipping unknown user");
            continue;
        };
        let previous = db::attach_user_to_group(&mut *conn, user_id, group_id).await?;
        if previous != Some(group_id) {
            notifications.push(Notification::new(
                &user.email,
                EmailType::GroupAssignment,
                [group_name, actor],
            ));
        }
    }
    Ok(notifications)
}

async fn load_group(conn: &mut PgConnection, id: Uuid) -> GroupResult<GroupView> {
    db::find_group_view(conn, id)
        .await?
        .ok_or(GroupError::GroupNotFound)
}

/// Create a group and attach the listed users.
///
/// POST /api/groups
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, name = %body.name))]
pub async fn create_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<GroupRequest>,
) -> GroupResult<(StatusCode, Json<GroupView>)> {
    body.check()?;
    let name = body.name.trim().to_string();
    let description = non_blank(body.description.clone());

    let mut tx = state.db.begin().await?;

    if db::find_group_by_name(&mut *tx, &name).await?.is_some() {
        return Err(GroupError::DuplicateName(name));
    }

    let group = db::create_group(&mut *tx, &name, description.as_deref())
        .await
        .map_err(map_duplicate(&name))?;

    let actor = actor_name(&mut tx, auth.id).await?;
    let mut notifications =
        attach_members(&mut tx, group.id, &group.name, &body.unique_user_ids(), &actor).await?;

    for admin in db::list_admins(&mut *tx).await? {
        notifications.push(Notification::new(
            &admin.email,
            EmailType::GroupCreated,
            [group.name.as_str(), actor.as_str()],
        ));
    }

    let view = load_group(&mut tx, group.id).await?;
    tx.commit().await?;

    state.notifier.notify_all(notifications);
    tracing::info!(group_id = %view.id, members = view.member_ids.len(), "Group created");

    Ok((StatusCode::CREATED, Json(view)))
}

/// List all groups.
///
/// GET /api/groups
pub async fn list_groups(State(state): State<AppState>) -> GroupResult<Json<Vec<GroupView>>> {
    Ok(Json(db::list_groups(&state.db).await?))
}

/// Get a group.
///
/// GET /api/groups/{id}
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> GroupResult<Json<GroupView>> {
    let group = db::find_group_view(&state.db, id)
        .await?
        .ok_or(GroupError::GroupNotFound)?;
    Ok(Json(group))
}

/// Rename a group and optionally replace its membership.
///
/// PUT /api/groups/{id}
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, group_id = %id))]
pub async fn update_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<GroupRequest>,
) -> GroupResult<Json<GroupView>> {
    body.check()?;
    let name = body.name.trim().to_string();
    let description = non_blank(body.description.clone());

    let mut tx = state.db.begin().await?;

    let group = db::find_group_by_id(&mut *tx, id)
        .await?
        .ok_or(GroupError::GroupNotFound)?;

    if group.name != name && db::find_group_by_name(&mut *tx, &name).await?.is_some() {
        return Err(GroupError::DuplicateName(name));
    }

    let group = db::update_group(&mut *tx, id, &name, description.as_deref())
        .await
        .map_err(map_duplicate(&name))?
        .ok_or(GroupError::GroupNotFound)?;

    let mut notifications = Vec::new();
    if body.user_ids.is_some() {
        let requested = body.unique_user_ids();
        let current = db::detach_all_members(&mut *tx, id).await?;
        let actor = actor_name(&mut tx, auth.id).await?;

        // Members that stay in the group are not notified again.
        let fresh: Vec<Uuid> = requested
            .iter()
            .copied()
            .filter(|uid| !current.contains(uid))
            .collect();
        let kept: Vec<Uuid> = requested
            .iter()
            .copied()
            .filter(|uid| current.contains(uid))
            .collect();

        attach_members(&mut tx, id, &group.name, &kept, &actor).await?;
        notifications = attach_members(&mut tx, id, &group.name, &fresh, &actor).await?;
    }

    let view = load_group(&mut tx, id).await?;
    tx.commit().await?;

    state.notifier.notify_all(notifications);
    tracing::info!(members = view.member_ids.len(), "Group updated");

    Ok(Json(view))
}

/// Detach all members and delete a group.
///
/// DELETE /api/groups/{id}
///
/// Assignments, submissions and messages of the group go with it; the
/// submitted files are removed after the commit.
#[tracing::instrument(skip(state), fields(admin_id = %auth.id, group_id = %id))]
pub async fn delete_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> GroupResult<StatusCode> {
    let mut tx = state.db.begin().await?;

    if db::find_group_by_id(&mut *tx, id).await?.is_none() {
        return Err(GroupError::GroupNotFound);
    }

    let detached = db::detach_all_members(&mut *tx, id).await?;
    let assignment_ids = db::list_assignment_ids_for_group(&mut *tx, id).await?;
    db::delete_group(&mut *tx, id).await?;

    tx.commit().await?;

    for assignment_id in assignment_ids {
        state.storage.remove_assignment_files(assignment_id).await;
    }

    tracing::info!(detached = detached.len(), "Group deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Move a user into a group.
///
/// PUT /api/groups/{id}/users/{user_id}
#[tracing::instrument(skip(state), fields(admin_id = %auth.id))]
pub async fn assign_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> GroupResult<Json<GroupView>> {
    let mut tx = state.db.begin().await?;

    let group = db::find_group_by_id(&mut *tx, id)
        .await?
        .ok_or(GroupError::GroupNotFound)?;
    let user = db::find_basic_user(&mut *tx, user_id)
        .await?
        .ok_or(GroupError::UserNotFound)?;

    let previous = db::attach_user_to_group(&mut *tx, user_id, id).await?;
    let actor = actor_name(&mut tx, auth.id).await?;

    let view = load_group(&mut tx, id).await?;
    tx.commit().await?;

    // Re-assigning to the same group is not announced.
    if previous != Some(id) {
        state.notifier.notify(Notification::new(
            &user.email,
            EmailType::GroupAssignment,
            [group.name.as_str(), actor.as_str()],
        ));
    }

    tracing::info!(
        user_id = %user_id,
        previous_group = ?previous,
        "User assigned to group"
    );

    Ok(Json(view))
}

/// Remove a user from a group.
///
/// DELETE /api/groups/{id}/users/{user_id}
#[tracing::instrument(skip(state), fields(admin_id = %auth.id))]
pub async fn remove_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> GroupResult<Json<GroupView>> {
    let mut tx = state.db.begin().await?;

    if db::find_group_by_id(&mut *tx, id).await?.is_none() {
        return Err(GroupError::GroupNotFound);
    }
    if db::find_basic_user(&mut *tx, user_id).await?.is_none() {
        return Err(GroupError::UserNotFound);
    }
    if db::find_user_group_id(&mut *tx, user_id).await? != Some(id) {
        return Err(GroupError::Validation(
            "User is not in this group".to_string(),
        ));
    }

    db::detach_user(&mut *tx, user_id).await?;
    let view = load_group(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, "User removed from group");

    Ok(Json(view))
}

/// Members of a group.
///
/// GET /api/groups/{id}/users
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> GroupResult<Json<Vec<UserView>>> {
    if db::find_group_by_id(&state.db, id).await?.is_none() {
        return Err(GroupError::GroupNotFound);
    }
    Ok(Json(db::list_group_members(&state.db, id).await?))
}
