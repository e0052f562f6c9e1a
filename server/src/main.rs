//! Student Portal Server - Main Entry Point

use anyhow::Result;
use tracing::{error, info, warn};

use portal_server::email::{EmailService, Notifier};
use portal_server::storage::FileStorage;
use portal_server::{api, auth, config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Student Portal Server"
    );

    // Initialize database
    let db_pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&db_pool).await?;
    auth::ensure_admin_account(&db_pool, &config).await?;

    // Initialize file storage
    let storage = FileStorage::from_config(&config);
    storage.init().await?;
    info!(root = %storage.root().display(), "File storage ready");

    // Initialize email (optional - notifications are only logged if not configured)
    let email = if config.has_smtp() {
        match EmailService::new(&config) {
            Ok(service) => {
                info!("SMTP email service configured");
                Some(service)
            }
            Err(e) => {
                warn!(error = %e, "SMTP initialization failed. Notifications disabled.");
                None
            }
        }
    } else {
        info!("SMTP not configured. Notifications will only be logged.");
        None
    };
    let notifier = Notifier::spawn(email);

    // Build application state and router
    let bind_address = config.bind_address.clone();
    let state = api::AppState::new(db_pool, config, storage, notifier);
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
