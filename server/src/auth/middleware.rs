//! Authentication Middleware
//!
//! Two layers cooperate:
//! - [`authenticate`] runs on every request. It turns a valid bearer token
//!   into an [`AuthUser`] in the request extensions and otherwise lets the
//!   request continue anonymously.
//! - [`require`] enforces a per-route [`Access`] policy before the handler runs.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::AppState;
use crate::db::Role;

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Authenticated principal injected into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
    /// Role carried by the token.
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Why a presented bearer token was not accepted.
///
/// Recorded in extensions so a protected route can report the precise
/// failure instead of a generic "authentication required".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Invalid,
    Expired,
}

/// Route access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No authentication needed.
    Public,
    /// Any authenticated caller.
    Authenticated,
    /// Caller must hold exactly this role.
    Role(Role),
    /// Caller must hold one of these roles.
    AnyRole(&'static [Role]),
}

/// Decide whether a caller satisfies a route policy.
pub fn authorize(access: Access, principal: Option<&AuthUser>) -> Result<(), AuthError> {
    let allowed_roles: &[Role] = match access {
        Access::Public => return Ok(()),
        Access::Authenticated => {
            return principal.map(|_| ()).ok_or(AuthError::MissingAuthHeader);
        }
        Access::Role(ref role) => std::slice::from_ref(role),
        Access::AnyRole(roles) => roles,
    };

    let user = principal.ok_or(AuthError::MissingAuthHeader)?;
    if allowed_roles.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Map an unauthenticated request to the error it should report.
fn unauthenticated(rejection: Option<TokenRejection>) -> AuthError {
    match rejection {
        Some(TokenRejection::Expired) => AuthError::TokenExpired,
        Some(TokenRejection::Invalid) => AuthError::InvalidToken,
        None => AuthError::MissingAuthHeader,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Decode a bearer token into a principal.
fn principal_from_token(token: &str, secret: &str) -> Result<AuthUser, AuthError> {
    let claims = validate_access_token(token, secret)?;
    Ok(AuthUser {
        id: claims.user_id()?,
        role: claims.role()?,
    })
}

/// Gate applied to the whole router.
///
/// Missing header or non-Bearer scheme leaves the request anonymous. A token
/// that fails validation also leaves it anonymous, with a [`TokenRejection`]
/// marker for routes that require authentication.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = bearer_token(request.headers())
        .map(|token| principal_from_token(token, &state.config.jwt_secret));

    match outcome {
        Some(Ok(user)) => {
            request.extensions_mut().insert(user);
        }
        Some(Err(AuthError::TokenExpired)) => {
            tracing::debug!("Expired bearer token, continuing anonymously");
            request.extensions_mut().insert(TokenRejection::Expired);
        }
        Some(Err(err)) => {
            tracing::debug!(error = %err, "Rejected bearer token, continuing anonymously");
            request.extensions_mut().insert(TokenRejection::Invalid);
        }
        None => {}
    }

    next.run(request).await
}

/// Build a middleware that enforces `access` before the handler runs.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/api/groups", post(create_group))
///     .layer(from_fn(require(Access::Role(Role::Admin))))
/// ```
pub fn require(
    access: Access,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone
       + Send
       + Sync
       + 'static {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let principal = request.extensions().get::<AuthUser>();
            match authorize(access, principal) {
                Ok(()) => next.run(request).await,
                Err(AuthError::MissingAuthHeader) => {
                    unauthenticated(request.extensions().get::<TokenRejection>().copied())
                        .into_response()
                }
                Err(err) => err.into_response(),
            }
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| unauthenticated(parts.extensions.get::<TokenRejection>().copied()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::auth::jwt::generate_access_token;

    const ADMIN_OR_USER: Access = Access::AnyRole(&[Role::Admin, Role::User]);

    fn principal(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::now_v7(),
            role,
        }
    }

    #[test]
    fn test_public_allows_anonymous() {
        assert!(authorize(Access::Public, None).is_ok());
        assert!(authorize(Access::Public, Some(&principal(Role::User))).is_ok());
    }

    #[test]
    fn test_authenticated_requires_principal() {
        assert!(matches!(
            authorize(Access::Authenticated, None),
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(authorize(Access::Authenticated, Some(&principal(Role::User))).is_ok());
    }

    #[test]
    fn test_role_policy() {
        let admin = principal(Role::Admin);
        let user = principal(Role::User);
        let admin_only = Access::Role(Role::Admin);

        assert!(authorize(admin_only, Some(&admin)).is_ok());
        assert!(matches!(
            authorize(admin_only, Some(&user)),
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(
            authorize(admin_only, None),
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(authorize(ADMIN_OR_USER, Some(&user)).is_ok());
        assert!(authorize(ADMIN_OR_USER, Some(&admin)).is_ok());
        assert!(matches!(
            authorize(Access::AnyRole(&[]), Some(&admin)),
            Err(AuthError::Forbidden)
        ));
    }

    #[test]
    fn test_unauthenticated_reports_token_rejection() {
        assert!(matches!(
            unauthenticated(Some(TokenRejection::Expired)),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            unauthenticated(Some(TokenRejection::Invalid)),
            AuthError::InvalidToken
        ));
        assert!(matches!(unauthenticated(None), AuthError::MissingAuthHeader));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_principal_from_token() {
        let id = Uuid::now_v7();
        let token = generate_access_token(id, Role::Admin, "secret").unwrap();
        let user = principal_from_token(&token, "secret").unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_admin());
        assert!(principal_from_token(&token, "other").is_err());
    }
}
