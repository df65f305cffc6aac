//! Stdio transport: JSON-RPC over stdin/stdout for a single client.

use crate::db::ConnectionManager;
use crate::error::{DbError, DbResult};
use crate::mcp::SchemaService;
use crate::transport::{Transport, shutdown_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::{info, warn};

pub struct StdioTransport {
    connection_manager: Arc<ConnectionManager>,
}

impl StdioTransport {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let running = SchemaService::new(self.connection_manager.clone())
            .serve(stdio())
            .await
            .map_err(|e| DbError::internal(format!("Failed to start stdio transport: {}", e)))?;

        let interrupted = tokio::select! {
            result = running.waiting() => {
                if let Err(e) = result {
                    warn!(error = %e, "Stdio transport error");
                    self.connection_manager.close_all().await;
                    return Err(DbError::internal(format!("Stdio transport error: {}", e)));
                }
                info!("Client disconnected");
                false
            }
            _ = shutdown_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if interrupted {
            tokio::spawn(async {
                shutdown_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        self.connection_manager.close_all().await;

        if interrupted {
            // a blocking stdin read would otherwise keep the process alive
            std::process::exit(0);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdio_transport_name() {
        let transport = StdioTransport::new(Arc::new(ConnectionManager::new()));
        assert_eq!(transport.name(), "stdio");
    }
}
