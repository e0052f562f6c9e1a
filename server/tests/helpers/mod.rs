//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router against a per-test database (`#[sqlx::test]`), plus utilities for
//! user creation, tokens, multipart bodies and the notification outbox.
//!
//! ## Outbox
//!
//! The app is wired to a channel-backed [`Notifier`]; call
//! [`TestApp::drain_outbox`] to see which emails a request queued.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use portal_server::api::{create_router, AppState};
use portal_server::auth::{hash_password, jwt};
use portal_server::config::Config;
use portal_server::db::{self, AccountStatus, Group, Role, User};
use portal_server::email::{EmailType, Notification, Notifier};
use portal_server::storage::FileStorage;
use sqlx::PgPool;
use tempfile::TempDir;
use tokio::sync::mpsc::Receiver;
use tower::ServiceExt;
use uuid::Uuid;

/// Password used for every helper-created account.
pub const TEST_PASSWORD: &str = "password123";

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
    outbox: Receiver<Notification>,
    /// Upload root; removed when the app is dropped.
    pub upload_dir: TempDir,
}

impl TestApp {
    /// Create a test app on the given (migrated) pool.
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, Config::default_for_test())
    }

    /// Create a test app with a custom config (for limit testing).
    ///
    /// `upload_dir` is always replaced by a fresh temporary directory.
    pub fn with_config(pool: PgPool, mut config: Config) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        config.upload_dir = upload_dir.path().to_path_buf();

        let storage = FileStorage::from_config(&config);
        let (notifier, outbox) = Notifier::channel();

        let config = Arc::new(config);
        let state = AppState::new(pool.clone(), (*config).clone(), storage, notifier);

        Self {
            router: create_router(state),
            pool,
            config,
            outbox,
            upload_dir,
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// GET with an optional bearer token.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Self::request(Method::GET, uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.oneshot(builder.body(Body::empty()).unwrap()).await
    }

    /// Send a JSON body with an optional bearer token.
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> Response<Body> {
        let mut builder =
            Self::request(method, uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.oneshot(request).await
    }

    /// Send a multipart form.
    pub async fn send_multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        form: MultipartForm,
    ) -> Response<Body> {
        let (content_type, body) = form.finish();
        let request = Self::request(method, uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.oneshot(request).await
    }

    /// Every notification queued since the last drain, in order.
    pub fn drain_outbox(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.outbox.try_recv().ok()).collect()
    }

    /// Queued notifications of one kind since the last drain.
    pub fn drain_outbox_of(&mut self, kind: EmailType) -> Vec<Notification> {
        self.drain_outbox()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    /// Access token for a user.
    pub fn token_for(&self, user: &User) -> String {
        jwt::generate_access_token(user.id, user.role, &self.config.jwt_secret)
            .expect("Failed to generate access token")
    }
}

// ============================================================================
// Multipart
// ============================================================================

/// Minimal `multipart/form-data` body builder.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("----portal-test-{}", Uuid::now_v7().simple()),
            body: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Content-Type header value and encoded body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

// ============================================================================
// Data helpers
// ============================================================================

/// Create an account with [`TEST_PASSWORD`].
///
/// Admins are created ACTIVE, students ONBOARDING.
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> User {
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let status = match role {
        Role::Admin => AccountStatus::Active,
        Role::User => AccountStatus::Onboarding,
    };
    db::create_user(
        pool,
        username,
        &format!("{username}@example.com"),
        &hash,
        role,
        status,
    )
    .await
    .expect("Failed to create test user")
}

/// Create an admin account.
pub async fn create_admin(pool: &PgPool, username: &str) -> User {
    create_user(pool, username, Role::Admin).await
}

/// Create a group directly in the database and attach the given users.
pub async fn create_group(pool: &PgPool, name: &str, members: &[Uuid]) -> Group {
    let group = db::create_group(pool, name, None)
        .await
        .expect("Failed to create group");
    for &user_id in members {
        db::attach_user_to_group(pool, user_id, group.id)
            .await
            .expect("Failed to attach member");
    }
    group
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_to_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// Collect a response body.
pub async fn body_to_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes()
        .to_vec()
}

/// Parse a UUID field of a JSON object.
pub fn json_uuid(value: &serde_json::Value, field: &str) -> Uuid {
    value[field]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("missing uuid field {field} in {value}"))
}
