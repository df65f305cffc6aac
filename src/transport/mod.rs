//! Transport layer for the MCP server.
//!
//! - Stdio: one client over stdin/stdout
//! - HTTP: streamable HTTP sessions served by axum

pub mod http;
pub mod stdio;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

use crate::error::DbResult;
use std::future::Future;
use tokio::signal;
use tracing::{info, warn};

/// An MCP transport. `run` resolves once the server has shut down and every
/// database connection has been closed.
pub trait Transport: Send + Sync {
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Name used in log lines.
    fn name(&self) -> &'static str;
}

/// Resolves on SIGINT or SIGTERM.
///
/// A handler that cannot be installed never fires; the other one still does.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
