//! User Management
//!
//! Admin-facing account operations: listing, editing, status changes and
//! reminder emails.

mod handlers;
mod types;

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};

use crate::api::AppState;
use crate::auth::{require, Access};
use crate::db::Role;

pub use types::UserError;

/// Create the user management router.
///
/// Admin routes:
/// - GET / - List student accounts
/// - GET /{id} - Get a user
/// - PUT /{id} - Update a user
/// - PUT /{id}/status - Change account status
/// - POST /{id}/reminder - Send a reminder email
///
/// Admin or user:
/// - GET /{id}/basic - Id, username and email of a user
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", get(handlers::list_users))
        .route("/{id}", get(handlers::get_user).put(handlers::update_user))
        .route("/{id}/status", put(handlers::change_status))
        .route("/{id}/reminder", post(handlers::send_reminder))
        .route_layer(from_fn(require(Access::Role(Role::Admin))));

    let shared_routes = Router::new()
        .route("/{id}/basic", get(handlers::get_basic_user))
        .route_layer(from_fn(require(Access::AnyRole(&[Role::Admin, Role::User]))));

    admin_routes.merge(shared_routes)
}
