//! # HTTP Server
//!
//! Serves the driver routes and drains running promotions on shutdown.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::driver::Driver;
use crate::lifecycle::Lifecycle;

use super::routes::driver_routes;

/// HTTP server of the repository driver
pub struct HttpServer {
    config: ServerConfig,
    lifecycle: Arc<Lifecycle>,
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServerConfig, driver: Arc<Driver>) -> Self {
        let lifecycle = driver.lifecycle().clone();
        let router = Self::build_router(driver);
        Self {
            config,
            lifecycle,
            router,
        }
    }

    fn build_router(driver: Arc<Driver>) -> Router {
        Router::new()
            .merge(driver_routes(driver))
            .layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until ctrl-c, then waits up to `shutdown_timeout` for running
    /// promotions.
    pub async fn start(self, shutdown_timeout: Duration) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid listen address {}: {}", self.config.socket_addr(), e),
            )
        })?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Repository driver listening");

        let lifecycle = self.lifecycle.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(lifecycle))
            .await?;

        let active = self.lifecycle.active_promotions();
        if active > 0 {
            tracing::info!(active, "Waiting for running promotions");
        }
        if !self.lifecycle.wait_for_idle(shutdown_timeout).await {
            tracing::warn!(
                active = self.lifecycle.active_promotions(),
                "Shutdown timeout reached with promotions still running"
            );
        }
        tracing::info!("Repository driver stopped");
        Ok(())
    }
}

async fn shutdown_signal(lifecycle: Arc<Lifecycle>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    lifecycle.begin_shutdown();
}
