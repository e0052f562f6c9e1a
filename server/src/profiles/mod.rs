//! Onboarding Profiles
//!
//! Personal details, work authorization and uploaded documents of a student,
//! with a completion percentage over nine tracked fields.

mod handlers;
mod types;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use crate::api::AppState;
use crate::auth::{require, Access};
use crate::db::Role;

pub use types::{DocumentType, ProfileError};

/// Create the profile router.
///
/// Authenticated routes:
/// - POST/GET/PUT /me - The caller's profile
/// - GET /me/completion - Completion percentage
/// - POST/DELETE /me/documents/{doc_type} - Upload or remove a document
///
/// Admin routes:
/// - GET/PUT /{user_id} - Any user's profile
pub fn router() -> Router<AppState> {
    let own_routes = Router::new()
        .route(
            "/me",
            post(handlers::create_my_profile)
                .get(handlers::get_my_profile)
                .put(handlers::update_my_profile),
        )
        .route("/me/completion", get(handlers::get_my_completion))
        .route(
            "/me/documents/{doc_type}",
            post(handlers::upload_document).delete(handlers::delete_document),
        )
        .route_layer(from_fn(require(Access::AnyRole(&[Role::Admin, Role::User]))));

    let admin_routes = Router::new()
        .route(
            "/{user_id}",
            get(handlers::get_user_profile).put(handlers::update_user_profile),
        )
        .route_layer(from_fn(require(Access::Role(Role::Admin))));

    own_routes.merge(admin_routes)
}
