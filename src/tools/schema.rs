//! Schema tools.
//!
//! This module implements the `list_tables`, `describe_table`,
//! `create_table`, `alter_table` and `drop_table` MCP tools.

use crate::db::gateway::{describe_columns, list_table_names};
use crate::db::{DatabaseGateway, queries};
use crate::error::{DbError, DbResult};
use crate::models::ColumnDescriptor;
use crate::tools::envelope::{DataResponse, StatusResponse};
use crate::tools::guard::{
    ALTER_TABLE_ONLY, ALTER_TABLE_PREFIX, CREATE_TABLE_ONLY, CREATE_TABLE_PREFIX,
    require_statement_prefix, require_table_name, require_writable,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const DROP_CONFIRMATION_REQUIRED: &str =
    "Safety confirmation required. Set confirm=true to proceed with dropping the table.";

const SQL_ERROR: &str = "SQL Error";
const DROP_ERROR: &str = "Error dropping table";
const LIST_ERROR: &str = "Error listing tables";
const DESCRIBE_ERROR: &str = "Error describing table";

/// Input for the create_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTableInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// A single CREATE TABLE statement
    pub query: String,
}

/// Input for the alter_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AlterTableInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// A single ALTER TABLE statement
    pub query: String,
}

/// Input for the drop_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DropTableInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Name of the table to drop
    pub table_name: String,
    /// Must be true for the table to be dropped. Default: false
    #[serde(default)]
    pub confirm: bool,
}

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Database connection ID from list_connections
    pub connection_id: String,
    /// Name of the table to describe
    pub table_name: String,
}

pub type ListTablesOutput = DataResponse<Vec<String>>;
pub type DescribeTableOutput = DataResponse<Vec<ColumnDescriptor>>;

pub struct SchemaToolHandler<G> {
    gateway: Arc<G>,
}

impl<G: DatabaseGateway> SchemaToolHandler<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn create_table(&self, input: CreateTableInput) -> DbResult<StatusResponse> {
        self.run_ddl(
            &input.connection_id,
            &input.query,
            CREATE_TABLE_PREFIX,
            CREATE_TABLE_ONLY,
        )
        .await
        .map_err(|e| e.context(SQL_ERROR))?;

        info!(connection_id = %input.connection_id, "Table created");
        Ok(StatusResponse::ok("Table created successfully"))
    }

    pub async fn alter_table(&self, input: AlterTableInput) -> DbResult<StatusResponse> {
        self.run_ddl(
            &input.connection_id,
            &input.query,
            ALTER_TABLE_PREFIX,
            ALTER_TABLE_ONLY,
        )
        .await
        .map_err(|e| e.context(SQL_ERROR))?;

        info!(connection_id = %input.connection_id, "Table altered");
        Ok(StatusResponse::ok("Table altered successfully"))
    }

    /// Without `confirm` this is refused before any database call.
    pub async fn drop_table(&self, input: DropTableInput) -> DbResult<StatusResponse> {
        let table = require_table_name(&input.table_name).map_err(|e| e.context(DROP_ERROR))?;

        if !input.confirm {
            warn!(
                connection_id = %input.connection_id,
                table = %table,
                "Refused drop_table without confirmation"
            );
            return Ok(StatusResponse::refused(DROP_CONFIRMATION_REQUIRED));
        }

        self.drop_confirmed(&input.connection_id, table)
            .await
            .map_err(|e| e.context(DROP_ERROR))?;

        info!(connection_id = %input.connection_id, table = %table, "Table dropped");
        Ok(StatusResponse::ok(format!(
            "Table '{}' dropped successfully",
            table
        )))
    }

    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<ListTablesOutput> {
        let names = list_table_names(self.gateway.as_ref(), &input.connection_id)
            .await
            .map_err(|e| e.context(LIST_ERROR))?;

        info!(
            connection_id = %input.connection_id,
            count = names.len(),
            "Listed tables"
        );
        Ok(DataResponse::ok(names))
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        let columns = self
            .describe(&input.connection_id, &input.table_name)
            .await
            .map_err(|e| e.context(DESCRIBE_ERROR))?;

        info!(
            connection_id = %input.connection_id,
            table = %input.table_name,
            columns = columns.len(),
            "Described table"
        );
        Ok(DataResponse::ok(columns))
    }

    async fn run_ddl(
        &self,
        connection_id: &str,
        query: &str,
        prefix: &str,
        rejection: &str,
    ) -> DbResult<()> {
        require_statement_prefix(query, prefix, rejection)?;
        let metadata = self.gateway.metadata(connection_id).await?;
        require_writable(&metadata, prefix)?;
        self.gateway.execute(connection_id, query).await
    }

    async fn drop_confirmed(&self, connection_id: &str, table: &str) -> DbResult<()> {
        let metadata = self.gateway.metadata(connection_id).await?;
        require_writable(&metadata, "drop table")?;
        self.require_existing(connection_id, table).await?;
        let sql = queries::drop_table(metadata.db_type, table);
        self.gateway.execute(connection_id, &sql).await
    }

    async fn describe(&self, connection_id: &str, table_name: &str) -> DbResult<Vec<ColumnDescriptor>> {
        let table = require_table_name(table_name)?;
        self.require_existing(connection_id, table).await?;
        let rows = describe_columns(self.gateway.as_ref(), connection_id, table).await?;
        Ok(rows.into_iter().map(ColumnDescriptor::from).collect())
    }

    /// Not atomic with whatever the caller runs next.
    async fn require_existing(&self, connection_id: &str, table: &str) -> DbResult<()> {
        let names = list_table_names(self.gateway.as_ref(), connection_id).await?;
        if names.iter().any(|n| n == table) {
            Ok(())
        } else {
            Err(DbError::table_not_found(table))
        }
    }
}
