//! JWT Token Generation and Validation
//!
//! HS256 access tokens signed with the configured `JWT_SECRET`. Tokens are
//! stateless: there is no session table and no revocation, so a token stays
//! valid for its whole lifetime even if the account changes meanwhile.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};
use crate::db::Role;

/// Access token lifetime: 24 hours.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string).
    pub sub: String,
    /// Role claim ("ADMIN" or "USER").
    pub role: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Parse the subject into a user id.
    pub fn user_id(&self) -> AuthResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    /// Parse the role claim.
    pub fn role(&self) -> AuthResult<Role> {
        Role::from_claim(&self.role).ok_or(AuthError::InvalidToken)
    }
}

/// Issue an access token for a user, valid for 24 hours from now.
pub fn generate_access_token(user_id: Uuid, role: Role, secret: &str) -> AuthResult<String> {
    generate_access_token_at(user_id, role, secret, Utc::now())
}

/// Issue an access token as if the current time were `issued_at`.
pub fn generate_access_token_at(
    user_id: Uuid,
    role: Role,
    secret: &str,
    issued_at: DateTime<Utc>,
) -> AuthResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::seconds(ACCESS_TOKEN_TTL_SECONDS)).timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Validate and decode an access token against the current time.
pub fn validate_access_token(token: &str, secret: &str) -> AuthResult<Claims> {
    validate_access_token_at(token, secret, Utc::now().timestamp())
}

/// Validate and decode an access token against an explicit Unix time.
///
/// The token is rejected once `now` is past `exp`.
pub fn validate_access_token_at(token: &str, secret: &str, now: i64) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is checked below against `now`.
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    if now > token_data.claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-testing";

    #[test]
    fn test_generate_and_validate() {
        let user_id = Uuid::now_v7();
        let token = generate_access_token(user_id, Role::User, SECRET).unwrap();

        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.role().unwrap(), Role::User);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECONDS);
    }

    #[test]
    fn test_expiry_boundary() {
        let issued_at = Utc::now() - Duration::days(3);
        let token =
            generate_access_token_at(Uuid::now_v7(), Role::Admin, SECRET, issued_at).unwrap();
        let exp = issued_at.timestamp() + ACCESS_TOKEN_TTL_SECONDS;

        assert!(validate_access_token_at(&token, SECRET, exp - 1).is_ok());
        assert!(validate_access_token_at(&token, SECRET, exp).is_ok());
        assert!(matches!(
            validate_access_token_at(&token, SECRET, exp + 1),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_invalid_secret_fails() {
        let token = generate_access_token(Uuid::now_v7(), Role::User, SECRET).unwrap();
        assert!(matches!(
            validate_access_token(&token, "wrong-secret"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_token_fails() {
        assert!(matches!(
            validate_access_token("not.a.token", SECRET),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            validate_access_token("", SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_unknown_role_claim_rejected() {
        let claims = Claims {
            sub: Uuid::now_v7().to_string(),
            role: "SUPERUSER".into(),
            iat: 0,
            exp: 0,
        };
        assert!(matches!(claims.role(), Err(AuthError::InvalidToken)));
    }
}
