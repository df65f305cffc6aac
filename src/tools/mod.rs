//! MCP tool implementations.
//!
//! - `schema`: list_tables, describe_table, create_table, alter_table, drop_table
//! - `guard`: statement-prefix, table-name and writable checks
//! - `envelope`: `{success, message}` / `{success, data}` responses

pub mod envelope;
pub mod guard;
pub mod schema;

pub use envelope::{DataResponse, StatusResponse};
pub use schema::{
    AlterTableInput, CreateTableInput, DescribeTableInput, DescribeTableOutput, DropTableInput,
    ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
