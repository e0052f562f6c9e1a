//! User Management Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::types::{
    ChangeStatusRequest, QueuedResponse, ReminderRequest, UpdateUserRequest, UserError,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, AccountStatus, BasicUser, Role, User, UserView};
use crate::email::{EmailType, Notification};
use crate::util::non_blank;

type UserResult<T> = Result<T, UserError>;

/// Apply a status change and build the notification for it.
///
/// Both the full account update and the dedicated status endpoint go through
/// here, so a change produces at most one email. Nothing is queued when the
/// status stays the same.
pub(crate) async fn apply_status_change(
    conn: &mut PgConnection,
    user: &User,
    new_status: AccountStatus,
    reason: Option<String>,
) -> UserResult<Option<Notification>> {
    if user.status == new_status {
        return Ok(None);
    }

    db::update_user_status(&mut *conn, user.id, new_status)
        .await?
        .ok_or(UserError::NotFound)?;

    let reason = non_blank(reason).unwrap_or_else(|| {
        format!(
            "Status updated from {} to {} by administrator",
            user.status, new_status
        )
    });

    Ok(Some(Notification::new(
        &user.email,
        EmailType::StatusChange,
        [new_status.to_string(), reason],
    )))
}

/// List all student accounts.
///
/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> UserResult<Json<Vec<UserView>>> {
    let users = db::list_users_by_role(&state.db, Role::User).await?;
    Ok(Json(users))
}

/// Get a user.
///
/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> UserResult<Json<UserView>> {
    let user = db::find_user_view(&state.db, id)
        .await?
        .ok_or(UserError::NotFound)?;
    Ok(Json(user))
}

/// Get the id/username/email of a user.
///
/// GET /api/users/{id}/basic
pub async fn get_basic_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> UserResult<Json<BasicUser>> {
    let user = db::find_basic_user(&state.db, id)
        .await?
        .ok_or(UserError::NotFound)?;
    Ok(Json(user))
}

/// Update account fields. Absent fields are left unchanged.
///
/// PUT /api/users/{id}
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, user_id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> UserResult<Json<UserView>> {
    body.validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let mut tx = state.db.begin().await?;

    let user = db::find_user_by_id(&mut *tx, id)
        .await?
        .ok_or(UserError::NotFound)?;

    let username = body.username.unwrap_or_else(|| user.username.clone());
    let email = body
        .email
        .map_or_else(|| user.email.clone(), |e| e.trim().to_lowercase());
    let role = body.role.unwrap_or(user.role);

    if username != user.username && db::username_exists(&mut *tx, &username).await? {
        return Err(UserError::DuplicateIdentity);
    }
    if email != user.email && db::email_exists(&mut *tx, &email).await? {
        return Err(UserError::DuplicateIdentity);
    }

    db::update_user_account(&mut *tx, id, &username, &email, role)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                UserError::DuplicateIdentity
            } else {
                UserError::Database(e)
            }
        })?
        .ok_or(UserError::NotFound)?;

    // The status email goes to the address the account has after this update.
    let notification = match body.status {
        Some(status) => {
            let updated = User {
                email: email.clone(),
                ..user
            };
            apply_status_change(&mut tx, &updated, status, body.reason).await?
        }
        None => None,
    };

    let view = db::find_user_view(&mut *tx, id)
        .await?
        .ok_or(UserError::NotFound)?;

    tx.commit().await?;

    if let Some(notification) = notification {
        state.notifier.notify(notification);
    }

    tracing::info!(role = %view.role, status = %view.status, "User updated");

    Ok(Json(view))
}

/// Change the account status of a user.
///
/// PUT /api/users/{id}/status
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, user_id = %id))]
pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangeStatusRequest>,
) -> UserResult<Json<UserView>> {
    body.validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let mut tx = state.db.begin().await?;

    let user = db::find_user_by_id(&mut *tx, id)
        .await?
        .ok_or(UserError::NotFound)?;
    let previous = user.status;

    let notification = apply_status_change(&mut tx, &user, body.status, body.reason).await?;

    let view = db::find_user_view(&mut *tx, id)
        .await?
        .ok_or(UserError::NotFound)?;

    tx.commit().await?;

    if let Some(notification) = notification {
        state.notifier.notify(notification);
        tracing::info!(from = %previous, to = %view.status, "Account status changed");
    }

    Ok(Json(view))
}

/// Send a reminder email to a user.
///
/// POST /api/users/{id}/reminder
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, user_id = %id))]
pub async fn send_reminder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ReminderRequest>,
) -> UserResult<Json<QueuedResponse>> {
    body.validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let user = db::find_basic_user(&state.db, id)
        .await?
        .ok_or(UserError::NotFound)?;

    state.notifier.notify(Notification::new(
        &user.email,
        EmailType::Reminder,
        [body.message],
    ));

    Ok(Json(QueuedResponse { queued: true }))
}
