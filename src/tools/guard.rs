//! Input guards for the schema-mutation tools.
//!
//! Statement checks are a plain prefix match on the trimmed, case-folded
//! query. Anything after the prefix is passed to the database verbatim, so a
//! trailing second statement is the database's to accept or reject.

use crate::error::{DbError, DbResult};
use crate::models::DatabaseMetadata;

pub const CREATE_TABLE_PREFIX: &str = "create table";
pub const ALTER_TABLE_PREFIX: &str = "alter table";

pub const CREATE_TABLE_ONLY: &str = "Only CREATE TABLE statements are allowed";
pub const ALTER_TABLE_ONLY: &str = "Only ALTER TABLE statements are allowed";
pub const TABLE_NAME_REQUIRED: &str = "Table name is required";

/// Fail with `message` unless `query` starts with `prefix`, ignoring case and
/// surrounding whitespace.
pub fn require_statement_prefix(query: &str, prefix: &str, message: &str) -> DbResult<()> {
    let head = query.trim_start().get(..prefix.len());
    if head.is_some_and(|h| h.eq_ignore_ascii_case(prefix)) {
        Ok(())
    } else {
        Err(DbError::invalid_input(message))
    }
}

/// Blank table names are treated as missing.
pub fn require_table_name(table_name: &str) -> DbResult<&str> {
    if table_name.trim().is_empty() {
        Err(DbError::invalid_input(TABLE_NAME_REQUIRED))
    } else {
        Ok(table_name)
    }
}

pub fn require_writable(metadata: &DatabaseMetadata, operation: &str) -> DbResult<()> {
    if metadata.writable {
        Ok(())
    } else {
        Err(DbError::permission(
            operation,
            "Connection is not writable. Use ?writable=true in the connection URL to enable schema changes",
        ))
    }
}
