//! Table-schema resources.
//!
//! Every table is published as `<base>/<table>/schema`, where the base URI
//! is derived from the connection's metadata:
//!
//! ```text
//! sqlite:///data/app.db/users/schema           file-based
//! postgresql://db.internal:5432/shop/users/schema  client-server
//! db:///database/users/schema                  anything else
//! ```
//!
//! The base only tells a client where a table lives. It is never parsed back
//! into connection parameters; reading a resource looks at the last two path
//! segments alone.

use crate::db::DatabaseGateway;
use crate::db::gateway::{describe_columns, list_table_names};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnSummary, DatabaseMetadata};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub const SCHEMA_SEGMENT: &str = "schema";
pub const MIME_TYPE: &str = "application/json";
pub const GENERIC_BASE_URI: &str = "db:///database";

const LIST_ERROR: &str = "Error listing resources";
const READ_ERROR: &str = "Error reading resource";

/// Where a connection's resources say they come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceOrigin {
    File {
        path: String,
    },
    Server {
        scheme: &'static str,
        server: String,
        database: String,
    },
    /// Metadata fits neither shape, e.g. a server-level connection.
    Generic,
}

impl ResourceOrigin {
    pub fn from_metadata(metadata: &DatabaseMetadata) -> Self {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);

        if metadata.db_type.is_file_based() {
            return match non_empty(&metadata.path) {
                Some(path) => Self::File { path },
                None => Self::Generic,
            };
        }

        match (non_empty(&metadata.server), non_empty(&metadata.database)) {
            (Some(server), Some(database)) => Self::Server {
                scheme: metadata.db_type.as_str(),
                server,
                database,
            },
            _ => Self::Generic,
        }
    }

    /// Base URI in its serialized URL form, e.g. a space in a file path
    /// becomes `%20`.
    ///
    /// A file path is always rendered absolute, so `data/app.db` and
    /// `/data/app.db` share the base `sqlite:///data/app.db`. When two
    /// connections share a base, routing picks the first of them.
    pub fn base_uri(&self) -> String {
        let raw = match self {
            Self::File { path } => format!("sqlite:///{}", path.trim_start_matches('/')),
            Self::Server {
                scheme,
                server,
                database,
            } => format!("{}://{}/{}", scheme, server, database),
            Self::Generic => GENERIC_BASE_URI.to_string(),
        };
        normalize_uri(&raw)
    }
}

/// Serialized form of `uri` once parsed as a URL, so raw and percent-encoded
/// spellings compare equal. Unparseable input is returned unchanged.
fn normalize_uri(uri: &str) -> String {
    Url::parse(uri).map(String::from).unwrap_or_else(|_| uri.to_string())
}

/// URL parsing collapses these segments, so no URI can address them.
fn is_dot_segment(table: &str) -> bool {
    matches!(table, "." | "..")
}

/// Append `<table>/schema` to `base`, percent-encoding the table name.
pub fn schema_uri(base: &str, table: &str) -> DbResult<String> {
    if is_dot_segment(table) {
        return Err(DbError::invalid_input(format!(
            "Table '{}' cannot be addressed by a resource URI",
            table
        )));
    }
    let mut url = Url::parse(base).map_err(|_| DbError::invalid_resource_uri(base))?;
    url.path_segments_mut()
        .map_err(|_| DbError::invalid_resource_uri(base))?
        .pop_if_empty()
        .push(table)
        .push(SCHEMA_SEGMENT);
    Ok(url.to_string())
}

/// Table name addressed by a `.../<table>/schema` URI.
pub fn table_from_uri(uri: &str) -> DbResult<String> {
    let invalid = || DbError::invalid_resource_uri(uri);
    let url = Url::parse(uri).map_err(|_| invalid())?;
    let segments: Vec<&str> = url.path_segments().ok_or_else(invalid)?.collect();

    match segments.as_slice() {
        [.., table, last] if *last == SCHEMA_SEGMENT && !table.is_empty() => {
            urlencoding::decode(table)
                .map(|t| t.into_owned())
                .map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResourcesOutput {
    pub resources: Vec<ResourceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceContent {
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadResourceOutput {
    pub contents: Vec<ResourceContent>,
}

pub struct ResourceLocator<G> {
    gateway: Arc<G>,
}

impl<G: DatabaseGateway> ResourceLocator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn base_uri(&self, db_id: &str) -> DbResult<String> {
        let metadata = self.gateway.metadata(db_id).await?;
        Ok(ResourceOrigin::from_metadata(&metadata).base_uri())
    }

    /// One schema resource per table, in table-listing order.
    pub async fn list_resources(&self, db_id: &str) -> DbResult<ListResourcesOutput> {
        self.build_listing(db_id)
            .await
            .map_err(|e| e.context(LIST_ERROR))
    }

    pub async fn read_resource(&self, db_id: &str, uri: &str) -> DbResult<ReadResourceOutput> {
        self.read_schema(db_id, uri)
            .await
            .map_err(|e| e.context(READ_ERROR))
    }

    /// Pick the connection a URI belongs to.
    ///
    /// The first id (in the given order) whose base URI prefixes `uri` wins.
    /// With a single connection every URI goes to it. Both sides are compared
    /// in serialized URL form.
    pub async fn resolve_connection(&self, db_ids: &[String], uri: &str) -> DbResult<String> {
        if let [only] = db_ids {
            return Ok(only.clone());
        }

        let normalized = normalize_uri(uri);
        for db_id in db_ids {
            match self.base_uri(db_id).await {
                Ok(base) if normalized.starts_with(&format!("{}/", base)) => {
                    debug!(connection_id = %db_id, uri = %uri, "Resolved resource URI");
                    return Ok(db_id.clone());
                }
                Ok(_) => {}
                Err(e) => warn!(connection_id = %db_id, error = %e, "Skipping connection"),
            }
        }

        Err(DbError::invalid_resource_uri(uri).context(READ_ERROR))
    }

    async fn build_listing(&self, db_id: &str) -> DbResult<ListResourcesOutput> {
        let base = self.base_uri(db_id).await?;
        let tables = list_table_names(self.gateway.as_ref(), db_id).await?;

        let resources = tables
            .into_iter()
            .filter(|table| {
                let addressable = !is_dot_segment(table);
                if !addressable {
                    warn!(
                        connection_id = %db_id,
                        table = %table,
                        "Table has no resource URI, skipping"
                    );
                }
                addressable
            })
            .map(|table| {
                Ok(ResourceDescriptor {
                    uri: schema_uri(&base, &table)?,
                    mime_type: MIME_TYPE.to_string(),
                    name: format!("\"{}\" database schema", table),
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        info!(connection_id = %db_id, count = resources.len(), "Listed resources");
        Ok(ListResourcesOutput { resources })
    }

    async fn read_schema(&self, db_id: &str, uri: &str) -> DbResult<ReadResourceOutput> {
        let table = table_from_uri(uri)?;
        let rows = describe_columns(self.gateway.as_ref(), db_id, &table).await?;
        let columns: Vec<ColumnSummary> = rows.into_iter().map(ColumnSummary::from).collect();
        let text = serde_json::to_string_pretty(&columns)
            .map_err(|e| DbError::internal(format!("Failed to serialize columns: {}", e)))?;

        info!(connection_id = %db_id, table = %table, "Read schema resource");
        Ok(ReadResourceOutput {
            contents: vec![ResourceContent {
                uri: uri.to_string(),
                mime_type: MIME_TYPE.to_string(),
                text,
            }],
        })
    }
}
