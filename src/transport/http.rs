//! Streamable HTTP transport served by axum.
//!
//! Every HTTP session gets its own `SchemaService`; all of them share the
//! same connection manager.

use crate::db::ConnectionManager;
use crate::error::{DbError, DbResult};
use crate::mcp::SchemaService;
use crate::transport::{Transport, shutdown_signal};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Open SSE streams can hold a graceful shutdown forever.
const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpTransport {
    connection_manager: Arc<ConnectionManager>,
    host: String,
    port: u16,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            connection_manager,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn router(&self) -> axum::Router {
        let connection_manager = self.connection_manager.clone();
        let service = StreamableHttpService::new(
            move || Ok(SchemaService::new(connection_manager.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // nest_service rejects "/"
        if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        }
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::connection(
                format!("Failed to bind to {}: {}", bind_addr, e),
                "Check that the port is available",
            )
        })?;
        info!(addr = %bind_addr, endpoint = %self.endpoint, "MCP server listening over HTTP");

        let stopping = Arc::new(Notify::new());
        let notify = stopping.clone();
        let server = axum::serve(listener, self.router()).with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        });

        tokio::select! {
            result = server => match result {
                Ok(()) => info!("HTTP server stopped"),
                Err(e) => {
                    error!(error = %e, "HTTP server error");
                    self.connection_manager.close_all().await;
                    return Err(DbError::internal(format!("HTTP server error: {}", e)));
                }
            },
            _ = async {
                stopping.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for sessions to close (send signal again to force exit)"
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => warn!("Graceful shutdown timed out"),
                    _ = shutdown_signal() => warn!("Received second signal, stopping now"),
                }
            } => {}
        }

        self.connection_manager.close_all().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(host: &str, port: u16, endpoint: &str) -> HttpTransport {
        HttpTransport::new(Arc::new(ConnectionManager::new()), host, port, endpoint)
    }

    #[test]
    fn test_http_transport_bind_addr() {
        let t = transport("0.0.0.0", 3000, "/mcp");
        assert_eq!(t.name(), "http");
        assert_eq!(t.bind_addr(), "0.0.0.0:3000");
        assert_eq!(t.endpoint(), "/mcp");
    }

    #[tokio::test]
    async fn test_router_builds_for_root_and_nested_endpoints() {
        let _ = transport("127.0.0.1", 8080, "/").router();
        let _ = transport("127.0.0.1", 8080, "/api/mcp").router();
    }
}
