//! Error types for the schema MCP server.
//!
//! Every failure is a [`DbError`]. Tool and resource handlers wrap whatever
//! went wrong underneath in a [`DbError::Context`] carrying a fixed,
//! operation-specific prefix, so the rendered message reads
//! `"Error dropping table: Table 'x' does not exist"` while the original
//! error stays reachable through [`std::error::Error::source`] and
//! [`DbError::kind`].

use thiserror::Error;

/// Coarse classification of a failure, independent of how deeply it is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied something unusable: bad SQL prefix, missing table
    /// name, malformed URI, read-only connection.
    Validation,
    /// A referenced table or connection does not exist.
    NotFound,
    /// The database layer failed while running a statement.
    Execution,
    /// A bug or an unexpected shape coming back from the database.
    Internal,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("{message}")]
    Database {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Permission denied: {operation} - {reason}")]
    Permission { operation: String, reason: String },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Connection not found: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Table '{table}' does not exist")]
    TableNotFound { table: String },

    #[error("Invalid resource URI: {uri}")]
    InvalidResourceUri { uri: String },

    #[error("Unexpected row shape from {query}: {message}")]
    RowShape { query: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<DbError>,
    },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    pub fn permission(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Permission {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    pub fn connection_not_found(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            connection_id: connection_id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    pub fn invalid_resource_uri(uri: impl Into<String>) -> Self {
        Self::InvalidResourceUri { uri: uri.into() }
    }

    pub fn row_shape(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RowShape {
            query: query.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wrap this error with an operation prefix, keeping it as the source.
    pub fn context(self, context: &'static str) -> Self {
        Self::Context {
            context,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context layers.
    pub fn root(&self) -> &DbError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classify the root cause of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::InvalidResourceUri { .. } | Self::Permission { .. } => {
                ErrorKind::Validation
            }
            Self::TableNotFound { .. } | Self::ConnectionNotFound { .. } => ErrorKind::NotFound,
            Self::Connection { .. } | Self::Database { .. } | Self::Timeout { .. } => {
                ErrorKind::Execution
            }
            Self::RowShape { .. } | Self::Internal { .. } => ErrorKind::Internal,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self.root() {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::TableNotFound { .. } => Some("Call list_tables to see the available tables"),
            Self::ConnectionNotFound { .. } => {
                Some("Call list_connections to see the configured database IDs")
            }
            _ => None,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Reconnect to the database")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::row_shape("query result", format!("column not found: {}", col))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData, keeping the full context chain in the message.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        let data = suggestion_data(err.suggestion());

        if let DbError::Database {
            sql_state: Some(code),
            ..
        } = err.root()
        {
            let msg = format!("{} (SQLSTATE: {})", err, code);
            return rmcp::ErrorData::invalid_params(msg, data);
        }

        match (err.kind(), err.root()) {
            (_, DbError::Database { .. }) => rmcp::ErrorData::invalid_params(err.to_string(), data),
            (ErrorKind::Validation, _) => rmcp::ErrorData::invalid_params(err.to_string(), data),
            (ErrorKind::NotFound, _) => rmcp::ErrorData::resource_not_found(err.to_string(), data),
            (ErrorKind::Execution, _) | (ErrorKind::Internal, _) => {
                rmcp::ErrorData::internal_error(err.to_string(), data)
            }
        }
    }
}
