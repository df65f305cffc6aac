//! Database abstraction layer.
//!
//! - Connection pool management
//! - Raw statement execution with timeouts
//! - Per-dialect introspection SQL
//! - Row decoding into JSON objects
//! - The [`DatabaseGateway`] seam used by tools and resources

pub mod executor;
pub mod gateway;
pub mod pool;
pub mod queries;
pub mod types;

pub use executor::QueryExecutor;
pub use gateway::DatabaseGateway;
pub use pool::{ConnectionManager, ConnectionSummary, DbPool};

/// A result row as a JSON object keyed by column name.
pub type JsonRow = serde_json::Map<String, serde_json::Value>;
