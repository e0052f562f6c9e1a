//! Chat Service
//!
//! Direct (onboarding) conversations between students and the admin, and
//! per-group threads.

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

pub use types::ChatError;

/// Create the chat router.
///
/// Admin or user:
/// - POST /send - Send a direct or group message
/// - GET /onboarding - The caller's conversation with the admin
/// - GET /group-chat - The caller's group thread
///
/// Admin routes:
/// - GET /onboarding/{user_id} - A student's conversation with the admin
/// - GET /group/{group_id} - Any group's thread
pub fn router() -> Router<AppState> {
    let member_routes = Router::new()
        .route("/send", post(handlers::send_message))
        .route("/onboarding", get(handlers::get_onboarding_chat))
        .route("/group-chat", get(handlers::get_group_chat))
        .route_layer(from_fn(require(Access::AnyRole(&[Role::Admin, Role::User]))));

    let admin_routes = Router::new()
        .route("/onboarding/{user_id}", get(handlers::get_user_onboarding_chat))
        .route("/group/{group_id}", get(handlers::get_group_chat_by_id))
        .route_layer(from_fn(require(Access::Role(Role::Admin))));

    member_routes.merge(admin_routes)
}
