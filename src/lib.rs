pub mod accounts;
pub mod api;
pub mod appointment;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod core_state;
pub mod db;
pub mod dispensing;
pub mod models;
pub mod ward;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::{CoreError, CoreState};

/// Audit rows older than this are dropped at startup.
const AUDIT_RETENTION_DAYS: i64 = 90;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    Server(String),
}

/// Load configuration, migrate the database and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let core = Arc::new(CoreState::new(&config));
    core.migrate()?;
    prune_audit_log(&core);

    let mut server = api::start_api_server(core, config.bind)
        .await
        .map_err(StartupError::Server)?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C, shutting down: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}

fn prune_audit_log(core: &CoreState) {
    let pruned = core
        .open_db()
        .map_err(|e| e.to_string())
        .and_then(|conn| {
            db::repository::prune_audit_log(&conn, AUDIT_RETENTION_DAYS).map_err(|e| e.to_string())
        });
    match pruned {
        Ok(0) => {}
        Ok(n) => tracing::info!(pruned = n, "Old audit entries removed"),
        Err(e) => tracing::warn!("Audit log pruning failed: {e}"),
    }
}
