//! HTTP front-end.
//!
//! One listener, two routes. Every request runs as its own task on the tokio
//! runtime; the only shared value is the immutable [`AppState`].

pub mod handlers;
mod state;

pub use state::AppState;

use crate::config::ServerConfig;
use crate::error::VibeError;
use axum::routing::any;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", any(handlers::status))
        .route("/findTheVibe", any(handlers::find_the_vibe))
        .route("/describe", any(handlers::find_the_vibe))
        .fallback(handlers::status)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A bound listener plus the router it will serve.
pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Bind the listener. Port 0 picks a free port (see [`Server::local_addr`]).
    pub async fn bind(config: &ServerConfig, state: AppState) -> Result<Self, VibeError> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            tracing::error!(stage = "startup", "Failed to bind listener to {addr}: {e}");
            e
        })?;
        Ok(Self {
            listener,
            router: build_router(state),
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> Result<SocketAddr, VibeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), VibeError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), VibeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("Server listening on {addr}");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
