//! MCP service implementation using rmcp.
//!
//! `SchemaService` exposes the schema tools through the rmcp tool macros and
//! serves every table of every connection as a schema resource.

use crate::db::{ConnectionManager, ConnectionSummary};
use crate::resources::ResourceLocator;
use crate::tools::envelope::StatusResponse;
use crate::tools::schema::{
    AlterTableInput, CreateTableInput, DescribeTableInput, DescribeTableOutput, DropTableInput,
    ListTablesInput, ListTablesOutput, SchemaToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        Implementation, ListResourcesResult, PaginatedRequestParam, ProtocolVersion,
        ReadResourceRequestParam, ReadResourceResult, ServerCapabilities, ServerInfo,
    },
    schemars::JsonSchema,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Output for the list_connections tool.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ListConnectionsOutput {
    /// Configured database connections, sorted by id
    pub connections: Vec<ConnectionSummary>,
    pub count: usize,
}

#[derive(Clone)]
pub struct SchemaService {
    connection_manager: Arc<ConnectionManager>,
    tool_router: ToolRouter<Self>,
}

impl SchemaService {
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self {
            connection_manager,
            tool_router: Self::tool_router(),
        }
    }

    fn tools(&self) -> SchemaToolHandler<ConnectionManager> {
        SchemaToolHandler::new(self.connection_manager.clone())
    }

    fn locator(&self) -> ResourceLocator<ConnectionManager> {
        ResourceLocator::new(self.connection_manager.clone())
    }

    /// Returns the trimmed connection ID, or an error pointing at list_connections.
    fn validate_connection_id(&self, provided: &str) -> Result<String, McpError> {
        let trimmed = provided.trim();
        if trimmed.is_empty() {
            Err(McpError::invalid_params(
                "connection_id is required. Call list_connections first to get available database IDs.",
                None,
            ))
        } else {
            Ok(trimmed.to_string())
        }
    }
}

/// Re-shape one of our payloads into the matching protocol type.
fn to_protocol<T: Serialize, R: DeserializeOwned>(value: &T) -> Result<R, McpError> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| McpError::internal_error(format!("Failed to encode payload: {}", e), None))
}

#[tool_router]
impl SchemaService {
    #[tool(
        description = "List all configured database connections.\nReturns connection IDs, types (MySQL/PostgreSQL/SQLite), and whether schema changes are allowed."
    )]
    async fn list_connections(&self) -> Json<ListConnectionsOutput> {
        let connections = self.connection_manager.list_connections_detail().await;
        let count = connections.len();
        Json(ListConnectionsOutput { connections, count })
    }

    #[tool(description = "List the names of all user tables in the database.")]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<Json<ListTablesOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        self.tools()
            .list_tables(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Describe the columns of a table.\nReturns name, type, notnull, default_value and primary_key for each column."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<Json<DescribeTableOutput>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        self.tools()
            .describe_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Create a table. The query must be a single statement starting with CREATE TABLE.\nRequires a writable connection."
    )]
    async fn create_table(
        &self,
        Parameters(input): Parameters<CreateTableInput>,
    ) -> Result<Json<StatusResponse>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        self.tools()
            .create_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Alter a table. The query must be a single statement starting with ALTER TABLE.\nRequires a writable connection."
    )]
    async fn alter_table(
        &self,
        Parameters(input): Parameters<AlterTableInput>,
    ) -> Result<Json<StatusResponse>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        self.tools()
            .alter_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Drop a table.\nNothing happens unless confirm=true; without it the call returns success=false.\nRequires a writable connection."
    )]
    async fn drop_table(
        &self,
        Parameters(input): Parameters<DropTableInput>,
    ) -> Result<Json<StatusResponse>, McpError> {
        let mut input = input;
        input.connection_id = self.validate_connection_id(&input.connection_id)?;
        self.tools()
            .drop_table(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for SchemaService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "db-schema-mcp".to_owned(),
                title: Some("DB Schema MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Schema tools for SQL databases.\n\
                \n\
                ## Workflow\n\
                1. Call `list_connections` to get available database IDs\n\
                2. Use the `connection_id` from step 1 in all other tool calls\n\
                3. `list_tables` and `describe_table` work on every connection\n\
                4. `create_table`, `alter_table` and `drop_table` need a writable connection\n\
                \n\
                ## Safety\n\
                - `create_table` only accepts statements starting with CREATE TABLE\n\
                - `alter_table` only accepts statements starting with ALTER TABLE\n\
                - `drop_table` does nothing unless `confirm` is true\n\
                \n\
                ## Resources\n\
                Each table is published as `<base>/<table>/schema`, a JSON array of\n\
                `{column_name, data_type}`."
                    .to_string(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let locator = self.locator();
        let mut resources = Vec::new();
        for db_id in self.connection_manager.connection_ids().await {
            let listing = locator.list_resources(&db_id).await?;
            resources.extend(listing.resources);
        }
        to_protocol(&serde_json::json!({ "resources": resources }))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let locator = self.locator();
        let ids = self.connection_manager.connection_ids().await;
        let db_id = locator.resolve_connection(&ids, &request.uri).await?;
        let output = locator.read_resource(&db_id, &request.uri).await?;
        to_protocol(&output)
    }
}
