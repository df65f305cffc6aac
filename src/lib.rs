//! DB Schema MCP Server Library
//!
//! MCP (Model Context Protocol) server for inspecting and changing the schema
//! of SQL databases (SQLite, PostgreSQL, MySQL). Tables are published as
//! JSON schema resources; create/alter/drop go through guarded tools.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod resources;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{DbError, DbResult};
pub use mcp::SchemaService;
