//! Chat Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::types::{ChatError, SendMessageRequest};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, Message, Role};
use crate::email::{EmailType, Notification};

type ChatResult<T> = Result<T, ChatError>;

/// Send a direct or group message.
///
/// POST /api/chat/send
#[tracing::instrument(skip(state, body), fields(sender_id = %auth.id, group_id = ?body.group_id))]
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> ChatResult<(StatusCode, Json<Message>)> {
    body.check()?;

    let mut tx = state.db.begin().await?;

    let sender = db::find_user_by_id(&mut *tx, auth.id)
        .await?
        .ok_or(ChatError::NotFound("Sender"))?;

    let mut notifications = Vec::new();

    let message = if let Some(group_id) = body.group_id {
        let group = db::find_group_by_id(&mut *tx, group_id)
            .await?
            .ok_or(ChatError::NotFound("Group"))?;

        if sender.role != Role::Admin
            && db::find_user_group_id(&mut *tx, sender.id).await? != Some(group.id)
        {
            return Err(ChatError::Forbidden);
        }

        let message =
            db::insert_message(&mut *tx, sender.id, None, Some(group.id), &body.content).await?;

        for member in db::list_group_members(&mut *tx, group.id).await? {
            if member.id == sender.id {
                continue;
            }
            notifications.push(Notification::new(
                member.email,
                EmailType::GroupMessage,
                [group.name.as_str(), sender.username.as_str(), body.content.as_str()],
            ));
        }
        message
    } else {
        let receiver = match sender.role {
            // Students always talk to the admin, whatever receiver they name.
            Role::User => db::find_primary_admin(&mut *tx)
                .await?
                .ok_or(ChatError::NotFound("Admin"))?,
            Role::Admin => {
                let receiver_id = body.receiver_id.ok_or_else(|| {
                    ChatError::Validation(
                        "Admin must specify receiver_id when sending direct messages".to_string(),
                    )
                })?;
                db::find_user_by_id(&mut *tx, receiver_id)
                    .await?
                    .ok_or(ChatError::NotFound("Receiver"))?
            }
        };

        let message =
            db::insert_message(&mut *tx, sender.id, Some(receiver.id), None, &body.content)
                .await?;

        notifications.push(Notification::new(
            receiver.email,
            EmailType::DirectMessage,
            [sender.username.as_str(), body.content.as_str()],
        ));
        message
    };

    tx.commit().await?;

    state.notifier.notify_all(notifications);
    tracing::debug!(message_id = %message.id, "Message sent");

    Ok((StatusCode::CREATED, Json(message)))
}

/// The caller's direct conversation with the admin.
///
/// GET /api/chat/onboarding
///
/// For an admin caller this is every direct message they sent or received.
pub async fn get_onboarding_chat(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ChatResult<Json<Vec<Message>>> {
    let messages = if auth.is_admin() {
        db::list_direct_messages(&state.db, auth.id).await?
    } else {
        db::list_onboarding_thread(&state.db, auth.id).await?
    };
    Ok(Json(messages))
}

/// The caller's group thread; empty when the caller has no group.
///
/// GET /api/chat/group-chat
pub async fn get_group_chat(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ChatResult<Json<Vec<Message>>> {
    let Some(group_id) = db::find_user_group_id(&state.db, auth.id).await? else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(db::list_group_thread(&state.db, group_id).await?))
}

/// A student's conversation with the admin.
///
/// GET /api/chat/onboarding/{user_id}
pub async fn get_user_onboarding_chat(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ChatResult<Json<Vec<Message>>> {
    if db::find_basic_user(&state.db, user_id).await?.is_none() {
        return Err(ChatError::NotFound("User"));
    }
    Ok(Json(db::list_onboarding_thread(&state.db, user_id).await?))
}

/// Any group's thread.
///
/// GET /api/chat/group/{group_id}
pub async fn get_group_chat_by_id(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> ChatResult<Json<Vec<Message>>> {
    if db::find_group_by_id(&state.db, group_id).await?.is_none() {
        return Err(ChatError::NotFound("Group"));
    }
    Ok(Json(db::list_group_thread(&state.db, group_id).await?))
}
