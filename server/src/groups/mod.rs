//! Groups
//!
//! Cohorts of students. A user belongs to at most one group; assignments and
//! group chat are scoped to it.

mod handlers;
mod types;

use axum::{
    middleware::from_fn,
    routing::{get, put},
    Router,
};

use crate::api::AppState;
use crate::auth::{require, Access};
use crate::db::Role;

pub use types::GroupError;

/// Create the group router.
///
/// Admin routes:
/// - POST / - Create a group
/// - GET / - List groups
/// - GET/PUT/DELETE /{id} - Read, update or delete a group
/// - PUT/DELETE /{id}/users/{user_id} - Assign or remove a member
///
/// Authenticated routes:
/// - GET /{id}/users - Members of a group
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route(
            "/",
            get(handlers::list_groups).post(handlers::create_group),
        )
        .route(
            "/{id}",
            get(handlers::get_group)
                .put(handlers::update_group)
                .delete(handlers::delete_group),
        )
        .route(
            "/{id}/users/{user_id}",
            put(handlers::assign_user).delete(handlers::remove_user),
        )
        .route_layer(from_fn(require(Access::Role(Role::Admin))));

    let member_routes = Router::new()
        .route("/{id}/users", get(handlers::list_members))
        .route_layer(from_fn(require(Access::Authenticated)));

    admin_routes.merge(member_routes)
}
