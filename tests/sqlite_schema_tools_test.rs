//! Integration tests for the schema tools against real SQLite files.
//!
//! Tests verify that:
//! - create/alter/drop change the schema on writable connections
//! - list_tables and describe_table reflect those changes
//! - drop_table does nothing without confirmation
//! - Read-only connections refuse every schema change

use db_schema_mcp::config::PoolOptions;
use db_schema_mcp::db::ConnectionManager;
use db_schema_mcp::error::ErrorKind;
use db_schema_mcp::models::ConnectionConfig;
use db_schema_mcp::tools::schema::{
    AlterTableInput, CreateTableInput, DROP_CONFIRMATION_REQUIRED, DescribeTableInput,
    DropTableInput, ListTablesInput, SchemaToolHandler,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const WRITABLE_ID: &str = "app";
const READONLY_ID: &str = "app-ro";

async fn connect(manager: &ConnectionManager, id: &str, path: &Path, writable: bool) {
    let conn_url = format!("sqlite:{}", path.display());
    let config =
        ConnectionConfig::new(id, &conn_url, writable, false, None, PoolOptions::default())
            .unwrap();
    manager.connect(config).await.unwrap();
}

/// Writable connection to a fresh database file. Keep the TempDir alive.
async fn setup_writable_db() -> (TempDir, SchemaToolHandler<ConnectionManager>) {
    let dir = TempDir::new().unwrap();
    let manager = Arc::new(ConnectionManager::new());
    connect(&manager, WRITABLE_ID, &dir.path().join("app.db"), true).await;
    (dir, SchemaToolHandler::new(manager))
}

/// Read-only connection to a database that already has a `users` table.
async fn setup_readonly_db() -> (TempDir, SchemaToolHandler<ConnectionManager>) {
    let (dir, writer) = setup_writable_db().await;
    create(&writer, WRITABLE_ID, "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();

    let manager = Arc::new(ConnectionManager::new());
    connect(&manager, READONLY_ID, &dir.path().join("app.db"), false).await;
    (dir, SchemaToolHandler::new(manager))
}

async fn create(
    handler: &SchemaToolHandler<ConnectionManager>,
    connection_id: &str,
    query: &str,
) -> db_schema_mcp::DbResult<db_schema_mcp::tools::StatusResponse> {
    handler
        .create_table(CreateTableInput {
            connection_id: connection_id.to_string(),
            query: query.to_string(),
        })
        .await
}

async fn tables(handler: &SchemaToolHandler<ConnectionManager>, connection_id: &str) -> Vec<String> {
    handler
        .list_tables(ListTablesInput {
            connection_id: connection_id.to_string(),
        })
        .await
        .unwrap()
        .data
}

fn drop_input(connection_id: &str, table: &str, confirm: bool) -> DropTableInput {
    DropTableInput {
        connection_id: connection_id.to_string(),
        table_name: table.to_string(),
        confirm,
    }
}

#[tokio::test]
async fn test_create_then_list_tables() {
    let (_dir, handler) = setup_writable_db().await;

    let response = create(&handler, WRITABLE_ID, "CREATE TABLE users (id INTEGER PRIMARY KEY)")
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Table created successfully");

    create(&handler, WRITABLE_ID, "create table accounts (id INTEGER)")
        .await
        .unwrap();

    assert_eq!(tables(&handler, WRITABLE_ID).await, vec!["accounts", "users"]);
}

#[tokio::test]
async fn test_list_tables_empty_database() {
    let (_dir, handler) = setup_writable_db().await;
    let response = handler
        .list_tables(ListTablesInput {
            connection_id: WRITABLE_ID.to_string(),
        })
        .await
        .unwrap();
    assert!(response.success);
    assert!(response.data.is_empty());
}

#[tokio::test]
async fn test_create_rejects_other_statements() {
    let (_dir, handler) = setup_writable_db().await;

    let err = create(&handler, WRITABLE_ID, "DROP TABLE users")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.to_string(),
        "SQL Error: Only CREATE TABLE statements are allowed"
    );
    assert!(tables(&handler, WRITABLE_ID).await.is_empty());
}

#[tokio::test]
async fn test_create_invalid_sql_reports_database_error() {
    let (_dir, handler) = setup_writable_db().await;

    let err = create(&handler, WRITABLE_ID, "CREATE TABLE broken (")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    assert!(err.to_string().starts_with("SQL Error: "), "{err}");
}

#[tokio::test]
async fn test_describe_table_columns() {
    let (_dir, handler) = setup_writable_db().await;
    create(
        &handler,
        WRITABLE_ID,
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, status TEXT DEFAULT 'active')",
    )
    .await
    .unwrap();

    let response = handler
        .describe_table(DescribeTableInput {
            connection_id: WRITABLE_ID.to_string(),
            table_name: "users".to_string(),
        })
        .await
        .unwrap();
    assert!(response.success);

    let columns = response.data;
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "name", "status"]);

    assert_eq!(columns[0].data_type, "INTEGER");
    assert!(columns[0].primary_key);
    assert!(!columns[1].primary_key);
    assert!(columns[1].notnull);
    assert!(!columns[2].notnull);
    assert_eq!(columns[1].default_value, serde_json::Value::Null);
    assert_eq!(columns[2].default_value, serde_json::json!("'active'"));
}

#[tokio::test]
async fn test_describe_missing_table() {
    let (_dir, handler) = setup_writable_db().await;

    let err = handler
        .describe_table(DescribeTableInput {
            connection_id: WRITABLE_ID.to_string(),
            table_name: "ghost".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "Error describing table: Table 'ghost' does not exist"
    );
}

#[tokio::test]
async fn test_alter_table_adds_column() {
    let (_dir, handler) = setup_writable_db().await;
    create(&handler, WRITABLE_ID, "CREATE TABLE users (id INTEGER PRIMARY KEY)")
        .await
        .unwrap();

    let response = handler
        .alter_table(AlterTableInput {
            connection_id: WRITABLE_ID.to_string(),
            query: "  ALTER TABLE users ADD COLUMN email TEXT".to_string(),
        })
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Table altered successfully");

    let columns = handler
        .describe_table(DescribeTableInput {
            connection_id: WRITABLE_ID.to_string(),
            table_name: "users".to_string(),
        })
        .await
        .unwrap()
        .data;
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[1].name, "email");
    assert_eq!(columns[1].data_type, "TEXT");
}

#[tokio::test]
async fn test_alter_rejects_create_statement() {
    let (_dir, handler) = setup_writable_db().await;

    let err = handler
        .alter_table(AlterTableInput {
            connection_id: WRITABLE_ID.to_string(),
            query: "CREATE TABLE users (id INTEGER)".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "SQL Error: Only ALTER TABLE statements are allowed"
    );
    assert!(tables(&handler, WRITABLE_ID).await.is_empty());
}

#[tokio::test]
async fn test_drop_without_confirm_keeps_table() {
    let (_dir, handler) = setup_writable_db().await;
    create(&handler, WRITABLE_ID, "CREATE TABLE users (id INTEGER)")
        .await
        .unwrap();

    let response = handler
        .drop_table(drop_input(WRITABLE_ID, "users", false))
        .await
        .unwrap();
    assert!(!response.success);
    assert_eq!(response.message, DROP_CONFIRMATION_REQUIRED);
    assert_eq!(tables(&handler, WRITABLE_ID).await, vec!["users"]);
}

#[tokio::test]
async fn test_drop_with_confirm_removes_table() {
    let (_dir, handler) = setup_writable_db().await;
    create(&handler, WRITABLE_ID, "CREATE TABLE users (id INTEGER)")
        .await
        .unwrap();
    create(&handler, WRITABLE_ID, "CREATE TABLE orders (id INTEGER)")
        .await
        .unwrap();

    let response = handler
        .drop_table(drop_input(WRITABLE_ID, "users", true))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.message, "Table 'users' dropped successfully");
    assert_eq!(tables(&handler, WRITABLE_ID).await, vec!["orders"]);
}

#[tokio::test]
async fn test_drop_missing_table() {
    let (_dir, handler) = setup_writable_db().await;

    let err = handler
        .drop_table(drop_input(WRITABLE_ID, "ghost", true))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "Error dropping table: Table 'ghost' does not exist"
    );
}

#[tokio::test]
async fn test_drop_requires_table_name() {
    let (_dir, handler) = setup_writable_db().await;

    let err = handler
        .drop_table(drop_input(WRITABLE_ID, "   ", true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Error dropping table: Table name is required");
}

#[tokio::test]
async fn test_readonly_refuses_schema_changes() {
    let (_dir, handler) = setup_readonly_db().await;

    let err = create(&handler, READONLY_ID, "CREATE TABLE other (id INTEGER)")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("Permission denied"), "{err}");

    let err = handler
        .alter_table(AlterTableInput {
            connection_id: READONLY_ID.to_string(),
            query: "ALTER TABLE users ADD COLUMN email TEXT".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Permission denied"), "{err}");

    let err = handler
        .drop_table(drop_input(READONLY_ID, "users", true))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Error dropping table: Permission denied"), "{err}");

    assert_eq!(tables(&handler, READONLY_ID).await, vec!["users"]);
}

#[tokio::test]
async fn test_readonly_allows_introspection() {
    let (_dir, handler) = setup_readonly_db().await;

    let columns = handler
        .describe_table(DescribeTableInput {
            connection_id: READONLY_ID.to_string(),
            table_name: "users".to_string(),
        })
        .await
        .unwrap()
        .data;
    assert_eq!(columns.len(), 2);
}

#[tokio::test]
async fn test_unknown_connection() {
    let (_dir, handler) = setup_writable_db().await;

    let err = handler
        .list_tables(ListTablesInput {
            connection_id: "missing".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        "Error listing tables: Connection not found: missing"
    );
}
