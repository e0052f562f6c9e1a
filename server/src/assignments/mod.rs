//! Assignments and Submissions
//!
//! Admins publish assignments to a group; students upload one file per
//! assignment, which admins then grade.

mod files;
mod handlers;
mod submissions;
mod types;

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};

use crate::api::AppState;
use crate::auth::{require, Access};
use crate::db::Role;

pub use types::AssignmentError;

/// Create the assignments router.
///
/// Authenticated routes:
/// - GET / - Assignments of the caller's group
/// - GET /{id} - Get an assignment
///
/// Admin routes:
/// - POST / - Create an assignment
/// - GET /all - Every assignment
/// - PUT/DELETE /{id} - Update or delete an assignment
/// - GET /{id}/submissions - Submissions for an assignment
pub fn assignments_router() -> Router<AppState> {
    let member_routes = Router::new()
        .route("/", get(handlers::list_my_assignments))
        .route("/{id}", get(handlers::get_assignment))
        .route_layer(from_fn(require(Access::Authenticated)));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_assignment))
        .route("/all", get(handlers::list_all_assignments))
        .route(
            "/{id}",
            put(handlers::update_assignment).delete(handlers::delete_assignment),
        )
        .route(
            "/{id}/submissions",
            get(handlers::list_assignment_submissions),
        )
        .route_layer(from_fn(require(Access::Role(Role::Admin))));

    member_routes.merge(admin_routes)
}

/// Create the submissions router.
///
/// Authenticated routes:
/// - POST / - Submit a file (multipart)
/// - GET /my - The caller's submissions
/// - GET /{id} - Get a submission (owner or admin)
///
/// Admin routes:
/// - PUT /{id}/evaluation - Grade a submission
/// - GET /assignment/{id} - Submissions for an assignment
pub fn submissions_router() -> Router<AppState> {
    let member_routes = Router::new()
        .route("/", post(submissions::create_submission))
        .route("/my", get(submissions::list_my_submissions))
        .route("/{id}", get(submissions::get_submission))
        .route_layer(from_fn(require(Access::Authenticated)));

    let admin_routes = Router::new()
        .route("/{id}/evaluation", put(submissions::evaluate_submission))
        .route(
            "/assignment/{id}",
            get(handlers::list_assignment_submissions),
        )
        .route_layer(from_fn(require(Access::Role(Role::Admin))));

    member_routes.merge(admin_routes)
}

/// Create the file download router (authenticated).
pub fn files_router() -> Router<AppState> {
    Router::new()
        .route(
            "/submissions/{id}/download",
            get(files::download_submission),
        )
        .route_layer(from_fn(require(Access::Authenticated)))
}
