//! Admin Account Bootstrap
//!
//! Creates the first ADMIN account from configuration when none exists.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

use super::handlers::RegisterRequest;
use super::password::hash_password;
use crate::config::Config;
use crate::db::{self, AccountStatus, Role};

/// Ensure an admin account exists.
///
/// Does nothing when an admin is already present. Without `ADMIN_*`
/// configuration a warning is logged, since onboarding chat needs an admin.
pub async fn ensure_admin_account(pool: &PgPool, config: &Config) -> Result<()> {
    if db::find_primary_admin(pool).await?.is_some() {
        return Ok(());
    }

    let (Some(username), Some(email), Some(password)) = (
        config.admin_username.as_deref(),
        config.admin_email.as_deref(),
        config.admin_password.as_deref(),
    ) else {
        warn!("No admin account exists and ADMIN_USERNAME/ADMIN_EMAIL/ADMIN_PASSWORD are not set");
        return Ok(());
    };

    // Same rules as registration.
    let seed = RegisterRequest {
        username: username.to_string(),
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    seed.validate()
        .map_err(|e| anyhow::anyhow!("Invalid ADMIN_USERNAME/ADMIN_EMAIL/ADMIN_PASSWORD: {e}"))?;

    let password_hash = hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    let admin = db::create_user(
        pool,
        &seed.username,
        &seed.email.to_lowercase(),
        &password_hash,
        Role::Admin,
        AccountStatus::Active,
    )
    .await
    .context("Failed to create bootstrap admin account")?;

    info!(user_id = %admin.id, username = %admin.username, "Bootstrap admin account created");
    Ok(())
}
