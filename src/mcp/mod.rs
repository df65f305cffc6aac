//! MCP server integration module.
//!
//! Connects the schema tools and resources to the MCP protocol using the
//! rmcp framework.

pub mod service;

pub use service::SchemaService;
