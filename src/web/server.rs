//! HTTP server lifecycle: bind → spawn background task → return handle
//! with shutdown channel.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::ConfigError;
use crate::core_state::CoreError;
use crate::web::router::web_router;
use crate::web::types::AppContext;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Startup error: {0}")]
    Core(#[from] CoreError),
    #[error("Template error: {0}")]
    Templates(#[from] tera::Error),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a running server.
pub struct WebServer {
    addr: SocketAddr,
    started_at: DateTime<Utc>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), std::io::Error>>,
}

impl WebServer {
    /// Address actually bound (resolves port 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown. In-flight requests finish first.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            let uptime_secs = (Utc::now() - self.started_at).num_seconds();
            tracing::info!(uptime_secs, "Server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn wait(self) -> Result<(), ServerError> {
        match self.task.await {
            Ok(result) => Ok(result?),
            Err(e) => Err(ServerError::Io(std::io::Error::other(e))),
        }
    }
}

/// Bind `addr` and serve the site in a background tokio task.
pub async fn start_server(ctx: AppContext, addr: SocketAddr) -> Result<WebServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr()?;

    let app = web_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Server received shutdown signal");
        };

        tracing::info!(%addr, "Server started");
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await;
        if let Err(e) = &result {
            tracing::error!("Server error: {e}");
        }
        tracing::info!("Server stopped");
        result
    });

    Ok(WebServer {
        addr,
        started_at: Utc::now(),
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::core_state::CoreState;

    fn test_context(dir: &std::path::Path) -> AppContext {
        let config = Config {
            database_dir: dir.to_path_buf(),
            database_name: "live".into(),
            secret_key: Some("live-secret".into()),
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 0,
            pbkdf2_iterations: 1_000,
        };
        AppContext::new(Arc::new(CoreState::new(&config).unwrap())).unwrap()
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = test_context(tmp.path());
        let mut server = start_server(ctx, "127.0.0.1:0".parse().unwrap())
            .await
            .expect("server should start");
        assert!(server.addr().port() > 0);

        let base = format!("http://{}", server.addr());
        let resp = reqwest::get(format!("{base}/")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(resp.text().await.unwrap().contains("Wardkeep"));

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let resp = client.get(format!("{base}/patients")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/login");

        server.shutdown();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let first = start_server(test_context(tmp.path()), "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let second = start_server(test_context(tmp.path()), first.addr()).await;
        assert!(matches!(second, Err(ServerError::Bind { .. })));
    }
}
