//! The database operations tools and resources are built on.
//!
//! Tool and resource handlers are generic over [`DatabaseGateway`] so they
//! can be exercised against an in-memory double without a live database.

use crate::db::{ConnectionManager, JsonRow, queries};
use crate::error::DbResult;
use crate::models::{ColumnInfoRow, DatabaseMetadata, TableNameRow, parse_rows};
use std::future::Future;

/// Operations the schema tools need from the database layer.
pub trait DatabaseGateway: Send + Sync {
    /// Describe a connection. Fails for unknown ids.
    fn metadata(&self, db_id: &str) -> impl Future<Output = DbResult<DatabaseMetadata>> + Send;

    /// SQL listing user tables, one `name` column per row.
    fn list_tables_query(&self, db_id: &str) -> impl Future<Output = DbResult<String>> + Send;

    /// SQL describing the columns of `table` as `name, type, notnull, dflt_value, pk`.
    fn describe_table_query(
        &self,
        db_id: &str,
        table: &str,
    ) -> impl Future<Output = DbResult<String>> + Send;

    fn fetch_all(
        &self,
        db_id: &str,
        sql: &str,
    ) -> impl Future<Output = DbResult<Vec<JsonRow>>> + Send;

    fn execute(&self, db_id: &str, sql: &str) -> impl Future<Output = DbResult<()>> + Send;
}

/// Names of the user tables of `db_id`, in query order.
pub async fn list_table_names<G: DatabaseGateway>(gateway: &G, db_id: &str) -> DbResult<Vec<String>> {
    let sql = gateway.list_tables_query(db_id).await?;
    let rows = gateway.fetch_all(db_id, &sql).await?;
    let rows: Vec<TableNameRow> = parse_rows(rows, &sql)?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

/// Column rows of `table`, in ordinal order.
pub async fn describe_columns<G: DatabaseGateway>(
    gateway: &G,
    db_id: &str,
    table: &str,
) -> DbResult<Vec<ColumnInfoRow>> {
    let sql = gateway.describe_table_query(db_id, table).await?;
    let rows = gateway.fetch_all(db_id, &sql).await?;
    parse_rows(rows, &sql)
}

impl DatabaseGateway for ConnectionManager {
    async fn metadata(&self, db_id: &str) -> DbResult<DatabaseMetadata> {
        Ok(self.get_config(db_id).await?.metadata())
    }

    async fn list_tables_query(&self, db_id: &str) -> DbResult<String> {
        let config = self.get_config(db_id).await?;
        Ok(queries::list_tables(config.db_type))
    }

    async fn describe_table_query(&self, db_id: &str, table: &str) -> DbResult<String> {
        let config = self.get_config(db_id).await?;
        Ok(queries::describe_table(config.db_type, table))
    }

    async fn fetch_all(&self, db_id: &str, sql: &str) -> DbResult<Vec<JsonRow>> {
        ConnectionManager::fetch_all(self, db_id, sql).await
    }

    async fn execute(&self, db_id: &str, sql: &str) -> DbResult<()> {
        ConnectionManager::execute(self, db_id, sql).await
    }
}
