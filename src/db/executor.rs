//! Raw SQL execution with a timeout.
//!
//! Introspection and DDL statements take no bind parameters, so everything
//! goes through the pool's `Executor` directly rather than as a prepared
//! statement. Some DDL cannot be prepared on MySQL.

use crate::db::JsonRow;
use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Query executor that handles database query execution.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    default_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Run a row-returning statement and decode every row.
    pub async fn fetch_all(&self, pool: &DbPool, sql: &str) -> DbResult<Vec<JsonRow>> {
        let start = Instant::now();
        debug!(sql = %sql, timeout_secs = self.default_timeout.as_secs(), "Executing query");

        let rows = match pool {
            DbPool::MySql(p) => collect(self.run_fetch(p, sql).await?),
            DbPool::Postgres(p) => collect(self.run_fetch(p, sql).await?),
            DbPool::SQLite(p) => collect(self.run_fetch(p, sql).await?),
        };

        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query finished"
        );
        Ok(rows)
    }

    /// Run a statement for its side effects.
    pub async fn execute(&self, pool: &DbPool, sql: &str) -> DbResult<()> {
        debug!(sql = %sql, timeout_secs = self.default_timeout.as_secs(), "Executing statement");

        let rows_affected = match pool {
            DbPool::MySql(p) => self.run_execute(p, sql).await?.rows_affected(),
            DbPool::Postgres(p) => self.run_execute(p, sql).await?.rows_affected(),
            DbPool::SQLite(p) => self.run_execute(p, sql).await?.rows_affected(),
        };

        debug!(rows_affected, "Statement finished");
        Ok(())
    }

    async fn run_fetch<'p, DB>(
        &self,
        pool: &'p sqlx::Pool<DB>,
        sql: &'p str,
    ) -> DbResult<Vec<DB::Row>>
    where
        DB: sqlx::Database,
        &'p sqlx::Pool<DB>: sqlx::Executor<'p, Database = DB>,
    {
        use sqlx::Executor;
        match timeout(self.default_timeout, pool.fetch_all(sql)).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(timeout_error("query execution", self.default_timeout)),
        }
    }

    async fn run_execute<'p, DB>(
        &self,
        pool: &'p sqlx::Pool<DB>,
        sql: &'p str,
    ) -> DbResult<DB::QueryResult>
    where
        DB: sqlx::Database,
        &'p sqlx::Pool<DB>: sqlx::Executor<'p, Database = DB>,
    {
        use sqlx::Executor;
        match timeout(self.default_timeout, pool.execute(sql)).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(timeout_error("statement execution", self.default_timeout)),
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(
            crate::config::DEFAULT_QUERY_TIMEOUT_SECS,
        ))
    }
}

fn collect<R: RowToJson>(rows: Vec<R>) -> Vec<JsonRow> {
    rows.iter().map(RowToJson::to_json_map).collect()
}

fn timeout_error(operation: &str, timeout: Duration) -> DbError {
    DbError::timeout(operation, timeout.as_secs() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let executor = QueryExecutor::default();
        assert_eq!(executor.default_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_error_message() {
        let err = timeout_error("query execution", Duration::from_secs(5));
        assert_eq!(err.to_string(), "Timeout: query execution exceeded 5s");
        assert_eq!(err.kind(), crate::error::ErrorKind::Execution);
    }
}
