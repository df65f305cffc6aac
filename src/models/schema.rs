//! Schema-related data models.
//!
//! Rows come back from the database layer as loose JSON objects. They are
//! parsed into the typed row structs here at the boundary, so a query that
//! projects the wrong columns fails immediately instead of leaking nulls
//! into tool output.

use crate::db::JsonRow;
use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One row of a list-tables query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableNameRow {
    pub name: String,
}

/// One row of a describe-table query (`PRAGMA table_info` shape).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnInfoRow {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(deserialize_with = "flag")]
    pub notnull: bool,
    #[serde(default)]
    pub dflt_value: JsonValue,
    /// SQLite reports the 1-based position within a composite key
    #[serde(deserialize_with = "flag")]
    pub pk: bool,
}

/// Accepts booleans, integers (non-zero is true) and their string forms.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => Ok(b),
        JsonValue::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "yes" => Ok(true),
            "0" | "false" | "f" | "no" | "" => Ok(false),
            other => s
                .trim()
                .parse::<i64>()
                .map(|v| v != 0)
                .map_err(|_| de::Error::custom(format!("invalid flag value '{}'", other))),
        },
        JsonValue::Null => Ok(false),
        other => Err(de::Error::custom(format!("invalid flag value {}", other))),
    }
}

/// Parse every row of a result set into `T`, naming the query on failure.
pub fn parse_rows<T: DeserializeOwned>(rows: Vec<JsonRow>, query: &str) -> DbResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(JsonValue::Object(row))
                .map_err(|e| DbError::row_shape(query.trim(), e.to_string()))
        })
        .collect()
}

/// Column as returned by the describe_table tool.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub notnull: bool,
    /// Default expression as reported by the database, null when absent
    pub default_value: JsonValue,
    pub primary_key: bool,
}

impl From<ColumnInfoRow> for ColumnDescriptor {
    fn from(row: ColumnInfoRow) -> Self {
        Self {
            name: row.name,
            data_type: row.data_type,
            notnull: row.notnull,
            default_value: row.dflt_value,
            primary_key: row.pk,
        }
    }
}

/// Name and type only, as served in schema resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column_name: String,
    pub data_type: String,
}

impl From<ColumnInfoRow> for ColumnSummary {
    fn from(row: ColumnInfoRow) -> Self {
        Self {
            column_name: row.name,
            data_type: row.data_type,
        }
    }
}
