pub mod config;
pub mod core_state;
pub mod credentials;
pub mod crypto;
pub mod db;
pub mod models;
pub mod session;
pub mod wards;
pub mod web;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::web::{AppContext, ServerError};

/// Start the site and serve until Ctrl-C.
pub async fn run() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let core = Arc::new(core_state::CoreState::new(&config)?);
    let ctx = AppContext::new(core)?;
    let mut server = web::start_server(ctx, config.bind_addr()).await?;
    tracing::info!(addr = %server.addr(), "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.wait().await
}
