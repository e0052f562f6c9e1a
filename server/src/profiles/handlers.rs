//! Profile Handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::types::{
    blank_profile, CompletionResponse, DocumentType, ProfileError, ProfileRequest,
    ProfileResponse,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db;

type ProfileResult<T> = Result<T, ProfileError>;

async fn load_profile(state: &AppState, user_id: Uuid) -> ProfileResult<db::UserDetails> {
    db::find_user_details(&state.db, user_id)
        .await?
        .ok_or(ProfileError::NotFound)
}

async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    body: ProfileRequest,
) -> ProfileResult<ProfileResponse> {
    body.check()?;

    let mut tx = state.db.begin().await?;
    let mut details = db::lock_user_details(&mut *tx, user_id)
        .await?
        .ok_or(ProfileError::NotFound)?;

    body.apply_to(&mut details);
    let saved = db::save_user_details(&mut *tx, &details).await?;
    tx.commit().await?;

    Ok(saved.into())
}

/// Create the caller's profile.
///
/// POST /api/user-details/me
#[tracing::instrument(skip(state, body), fields(user_id = %auth.id))]
pub async fn create_my_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileRequest>,
) -> ProfileResult<(StatusCode, Json<ProfileResponse>)> {
    body.check()?;
    if body.first_name.is_none() || body.last_name.is_none() {
        return Err(ProfileError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    if db::find_user_by_id(&mut *tx, auth.id).await?.is_none() {
        return Err(ProfileError::NotFound);
    }
    if db::find_user_details(&mut *tx, auth.id).await?.is_some() {
        return Err(ProfileError::AlreadyExists);
    }

    let mut details = blank_profile(auth.id);
    body.apply_to(&mut details);

    let created = db::insert_user_details(&mut *tx, &details)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ProfileError::AlreadyExists
            } else {
                ProfileError::Database(e)
            }
        })?;
    tx.commit().await?;

    tracing::info!("Profile created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// The caller's profile.
///
/// GET /api/user-details/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ProfileResult<Json<ProfileResponse>> {
    Ok(Json(load_profile(&state, auth.id).await?.into()))
}

/// Partially update the caller's profile.
///
/// PUT /api/user-details/me
#[tracing::instrument(skip(state, body), fields(user_id = %auth.id))]
pub async fn update_my_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileRequest>,
) -> ProfileResult<Json<ProfileResponse>> {
    Ok(Json(update_profile(&state, auth.id, body).await?))
}

/// Completion percentage of the caller's profile.
///
/// GET /api/user-details/me/completion
pub async fn get_my_completion(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ProfileResult<Json<CompletionResponse>> {
    let details = load_profile(&state, auth.id).await?;
    let completion_percentage = details.completion_percentage();
    Ok(Json(CompletionResponse {
        user_id: auth.id,
        completion_percentage,
        is_completed: completion_percentage == 100,
    }))
}

/// Upload (or replace) a profile document.
///
/// POST /api/user-details/me/documents/{doc_type}
///
/// Multipart form with a single `file` field.
#[tracing::instrument(skip(state, multipart), fields(user_id = %auth.id, doc_type = doc_type.as_str()))]
pub async fn upload_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(doc_type): Path<DocumentType>,
    mut multipart: Multipart,
) -> ProfileResult<Json<ProfileResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(String::from).unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|e| ProfileError::Validation(e.to_string()))?;
        upload = Some((filename, data.to_vec()));
    }

    let (filename, data) =
        upload.ok_or_else(|| ProfileError::Validation("file is required".to_string()))?;

    load_profile(&state, auth.id).await?;

    let stored = state
        .storage
        .store_profile_document(
            auth.id,
            doc_type.as_str(),
            doc_type.allowed_extensions(),
            &filename,
            &data,
        )
        .await?;

    // The row lock orders concurrent edits, so the file each one replaces is
    // the one the previous edit stored.
    let result = async {
        let mut tx = state.db.begin().await?;
        let mut details = db::lock_user_details(&mut *tx, auth.id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let previous = doc_type.slot(&mut details).replace(stored.relative_path.clone());
        details.profile_completed = details.is_complete();

        let saved = db::save_user_details(&mut *tx, &details).await?;
        tx.commit().await?;
        Ok::<_, ProfileError>((saved, previous))
    }
    .await;

    let (saved, previous) = match result {
        Ok(ok) => ok,
        Err(e) => {
            state.storage.remove_quietly(&stored.relative_path).await;
            return Err(e);
        }
    };

    if let Some(previous) = previous {
        state.storage.remove_quietly(&previous).await;
    }

    tracing::info!(path = %stored.relative_path, size = stored.size, "Profile document stored");

    Ok(Json(saved.into()))
}

/// Remove a profile document. Removing a missing document is a no-op.
///
/// DELETE /api/user-details/me/documents/{doc_type}
#[tracing::instrument(skip(state), fields(user_id = %auth.id, doc_type = doc_type.as_str()))]
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(doc_type): Path<DocumentType>,
) -> ProfileResult<Json<ProfileResponse>> {
    let mut tx = state.db.begin().await?;
    let mut details = db::lock_user_details(&mut *tx, auth.id)
        .await?
        .ok_or(ProfileError::NotFound)?;

    let Some(previous) = doc_type.slot(&mut details).take() else {
        return Ok(Json(details.into()));
    };
    details.profile_completed = details.is_complete();

    let saved = db::save_user_details(&mut *tx, &details).await?;
    tx.commit().await?;

    state.storage.remove_quietly(&previous).await;

    Ok(Json(saved.into()))
}

/// Any user's profile.
///
/// GET /api/user-details/{user_id}
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ProfileResult<Json<ProfileResponse>> {
    Ok(Json(load_profile(&state, user_id).await?.into()))
}

/// Partially update any user's profile.
///
/// PUT /api/user-details/{user_id}
#[tracing::instrument(skip(state, body), fields(admin_id = %auth.id, user_id = %user_id))]
pub async fn update_user_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ProfileRequest>,
) -> ProfileResult<Json<ProfileResponse>> {
    Ok(Json(update_profile(&state, user_id, body).await?))
}
