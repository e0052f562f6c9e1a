//! Authentication Service
//!
//! Registration, login, token validation and the per-route access policy.

mod bootstrap;
mod error;
mod handlers;
pub mod jwt;
mod middleware;
mod password;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use bootstrap::ensure_admin_account;
pub use error::{AuthError, AuthResult, ErrorResponse};
pub use middleware::{authenticate, authorize, require, Access, AuthUser, TokenRejection};
pub use password::{hash_password, verify_password};

/// Create authentication router.
///
/// Public routes:
/// - POST /register - Register a new user
/// - POST /login - Login with username/password
///
/// Protected routes:
/// - GET /me - Current user
pub fn router() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(from_fn(require(Access::Authenticated)));

    public_routes.merge(protected_routes)
}
