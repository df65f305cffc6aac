//! Introspection SQL, one dialect per database type.
//!
//! Every dialect projects the same column shapes so callers parse results
//! the same way regardless of the backend:
//!
//! - list tables: `name`
//! - describe table: `name`, `type`, `notnull`, `dflt_value`, `pk`
//!
//! Table names are embedded as string literals with single quotes doubled.

use crate::models::DatabaseType;

/// Escape a value for use inside a single-quoted SQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Query returning one row per user table, ordered by name.
pub fn list_tables(db_type: DatabaseType) -> String {
    match db_type {
        DatabaseType::SQLite => "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name"
            .to_string(),
        DatabaseType::PostgreSQL => "SELECT table_name::text AS name \
             FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
            .to_string(),
        DatabaseType::MySQL => "SELECT CONVERT(TABLE_NAME USING utf8mb4) AS name \
             FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_NAME"
            .to_string(),
    }
}

/// Query returning one row per column of `table`, in ordinal order.
pub fn describe_table(db_type: DatabaseType, table: &str) -> String {
    let literal = quote_literal(table);
    match db_type {
        DatabaseType::SQLite => format!("PRAGMA table_info({})", literal),
        DatabaseType::PostgreSQL => format!(
            "SELECT c.column_name::text AS name, \
                    c.data_type::text AS type, \
                    CASE WHEN c.is_nullable = 'NO' THEN 1 ELSE 0 END AS notnull, \
                    c.column_default::text AS dflt_value, \
                    CASE WHEN EXISTS ( \
                        SELECT 1 FROM information_schema.table_constraints tc \
                        JOIN information_schema.key_column_usage kcu \
                          ON tc.constraint_name = kcu.constraint_name \
                         AND tc.table_schema = kcu.table_schema \
                         AND tc.table_name = kcu.table_name \
                        WHERE tc.constraint_type = 'PRIMARY KEY' \
                          AND tc.table_schema = c.table_schema \
                          AND tc.table_name = c.table_name \
                          AND kcu.column_name = c.column_name \
                    ) THEN 1 ELSE 0 END AS pk \
             FROM information_schema.columns c \
             WHERE c.table_schema = current_schema() AND c.table_name = {} \
             ORDER BY c.ordinal_position",
            literal
        ),
        DatabaseType::MySQL => format!(
            "SELECT CONVERT(COLUMN_NAME USING utf8mb4) AS name, \
                    CONVERT(COLUMN_TYPE USING utf8mb4) AS type, \
                    IF(IS_NULLABLE = 'NO', 1, 0) AS notnull, \
                    CONVERT(COLUMN_DEFAULT USING utf8mb4) AS dflt_value, \
                    IF(COLUMN_KEY = 'PRI', 1, 0) AS pk \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = {} \
             ORDER BY ORDINAL_POSITION",
            literal
        ),
    }
}

/// Statement dropping `table`. The name is double-quoted as-is.
pub fn drop_table(db_type: DatabaseType, table: &str) -> String {
    match db_type {
        DatabaseType::MySQL => format!("DROP TABLE `{}`", table),
        DatabaseType::PostgreSQL | DatabaseType::SQLite => format!("DROP TABLE \"{}\"", table),
    }
}
