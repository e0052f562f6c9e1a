//! API Router and Application State

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::email::Notifier;
use crate::storage::FileStorage;
use crate::{assignments, auth, chat, groups, profiles, users};

/// Multipart framing overhead allowed on top of the file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// Uploaded file storage
    pub storage: FileStorage,
    /// Notification email queue
    pub notifier: Notifier,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config, storage: FileStorage, notifier: Notifier) -> Self {
        Self {
            db,
            config: Arc::new(config),
            storage,
            notifier,
        }
    }
}

/// Create the main application router.
///
/// Every request passes through [`auth::authenticate`]; each route group then
/// applies its own access policy.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth::router())
        .nest("/api/users", users::router())
        .nest("/api/user-details", profiles::router())
        .nest("/api/groups", groups::router())
        .nest("/api/chat", chat::router())
        .nest("/api/assignments", assignments::assignments_router())
        .nest("/api/submissions", assignments::submissions_router())
        .nest("/api/files", assignments::files_router())
        .layer(from_fn_with_state(state.clone(), auth::authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether a database connection could be acquired
    database: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();
    Json(HealthResponse {
        status: "ok",
        database,
    })
}
