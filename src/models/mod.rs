//! Data models for the schema MCP server.

pub mod connection;
pub mod schema;

pub use connection::{
    ConnectionConfig, ConnectionConfigError, ConnectionInfo, DatabaseMetadata, DatabaseType,
};
pub use schema::{ColumnDescriptor, ColumnInfoRow, ColumnSummary, TableNameRow, parse_rows};
