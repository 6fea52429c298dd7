pub mod api; // REST surface: router, handlers, server lifecycle
pub mod config;
pub mod db;
pub mod models;
pub mod scheduling; // Appointment rules + patient lookup

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::ServerError;
use crate::config::{ConfigError, ServerConfig};
use crate::db::{DatabaseError, SqliteStore};

/// Top-level failure of the server binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Server error: {0}")]
    Server(#[from] ServerError),
    #[error("Signal handling error: {0}")]
    Signal(#[from] std::io::Error),
}

/// Initialize tracing. `RUST_LOG` wins over the built-in default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Run the scheduling server until Ctrl-C.
pub async fn run() -> Result<(), AppError> {
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = ServerConfig::from_env()?;
    tracing::info!(
        database = %settings.database_path.display(),
        "Opening database"
    );
    let store = Arc::new(SqliteStore::open(&settings.database_path)?);

    let server = api::start_api_server(store, settings.bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    server.stop().await;

    Ok(())
}
