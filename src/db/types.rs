//! Row-to-JSON decoding.
//!
//! The introspection queries sent to MySQL and PostgreSQL project integer
//! flags and text only, so those rows are decoded by classifying each
//! column's declared type as one or the other. SQLite has no declared type
//! for `PRAGMA` results, so SQLite values are decoded by their runtime
//! storage class instead.

use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::JsonRow;

/// Logical category for a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Text,
}

const INTEGER_TYPES: &[&str] = &[
    "tinyint", "smallint", "mediumint", "int", "integer", "bigint", "int2", "int4", "int8",
];

/// Classify a declared type name. Anything that is not an integer type is
/// read as text.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_ascii_lowercase();
    let base = lower.trim_end_matches(" unsigned");
    if INTEGER_TYPES.contains(&base) {
        TypeCategory::Integer
    } else {
        TypeCategory::Text
    }
}

/// Binary values are always rendered as standard base64.
pub fn binary_to_json(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    JsonValue::String(STANDARD.encode(bytes))
}

fn float_to_json(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

/// Conversion of a driver row into a JSON object keyed by column name.
pub trait RowToJson {
    fn to_json_map(&self) -> JsonRow;
}

/// Try each `type => mapper` pair in order; the first type the driver
/// decodes the column as wins. Null when none does or the value is NULL.
macro_rules! first_decodable {
    ($row:expr, $idx:expr, { $($ty:ty => $map:expr),+ $(,)? }) => {{
        let mut value = JsonValue::Null;
        $(
            if value.is_null() {
                if let Ok(Some(v)) = $row.try_get::<Option<$ty>, _>($idx) {
                    value = $map(v);
                }
            }
        )+
        value
    }};
}

/// `RowToJson` for a driver that reports declared column types.
macro_rules! impl_typed_row_to_json {
    ($row:ty, integers: [$($int:ty),+], text: $text:path) => {
        impl RowToJson for $row {
            fn to_json_map(&self) -> JsonRow {
                self.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, col)| {
                        let value = match categorize_type(col.type_info().name()) {
                            TypeCategory::Integer => {
                                first_decodable!(self, idx, { $($int => JsonValue::from),+ })
                            }
                            TypeCategory::Text => $text(self, idx),
                        };
                        (col.name().to_string(), value)
                    })
                    .collect()
            }
        }
    };
}

impl_typed_row_to_json!(MySqlRow, integers: [i8, i16, i32, i64, u32, u64], text: mysql_text);

impl_typed_row_to_json!(PgRow, integers: [i16, i32, i64], text: pg_text);

impl RowToJson for SqliteRow {
    fn to_json_map(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name().to_string(), sqlite::decode_column(self, idx)))
            .collect()
    }
}

/// information_schema columns may arrive as VARBINARY depending on server
/// version and collation.
fn mysql_text(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<String>, _>(idx) {
        Ok(v) => v.map_or(JsonValue::Null, JsonValue::String),
        Err(_) => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map_or(JsonValue::Null, |v| {
                JsonValue::String(String::from_utf8_lossy(&v).into_owned())
            }),
    }
}

fn pg_text(row: &PgRow, idx: usize) -> JsonValue {
    first_decodable!(row, idx, { String => JsonValue::String })
}

mod sqlite {
    use super::*;

    /// Runtime storage class names reported by SQLite values.
    const INTEGER: &str = "INTEGER";
    const REAL: &str = "REAL";
    const BLOB: &str = "BLOB";

    /// Every SQLite value has one of the five storage classes, whatever the
    /// query, so all of them are handled.
    pub fn decode_column(row: &SqliteRow, idx: usize) -> JsonValue {
        let storage = match row.try_get_raw(idx) {
            Ok(value) if value.is_null() => return JsonValue::Null,
            Ok(value) => value.type_info().name().to_string(),
            Err(e) => {
                tracing::error!("Failed to read SQLite column {}: {:?}", idx, e);
                return JsonValue::Null;
            }
        };

        match storage.as_str() {
            INTEGER => row
                .try_get::<i64, _>(idx)
                .map(|v| JsonValue::Number(v.into()))
                .unwrap_or(JsonValue::Null),
            REAL => row
                .try_get::<f64, _>(idx)
                .map(float_to_json)
                .unwrap_or(JsonValue::Null),
            BLOB => row
                .try_get::<Vec<u8>, _>(idx)
                .map(|v| binary_to_json(&v))
                .unwrap_or(JsonValue::Null),
            _ => row
                .try_get_unchecked::<String, _>(idx)
                .map(JsonValue::String)
                .unwrap_or(JsonValue::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integer_types() {
        for name in ["INT", "BIGINT", "bigint unsigned", "int4", "INT8", "TINYINT"] {
            assert_eq!(categorize_type(name), TypeCategory::Integer, "{name}");
        }
    }

    #[test]
    fn test_categorize_everything_else_as_text() {
        for name in ["VARCHAR", "TEXT", "LONGTEXT", "name", "interval", "point"] {
            assert_eq!(categorize_type(name), TypeCategory::Text, "{name}");
        }
    }

    #[test]
    fn test_binary_to_json_is_base64() {
        assert_eq!(
            binary_to_json(b"hello world"),
            JsonValue::String("aGVsbG8gd29ybGQ=".to_string())
        );
        assert_eq!(
            binary_to_json(&[0xFF, 0xFE, 0x00, 0x01]),
            JsonValue::String("//4AAQ==".to_string())
        );
    }

    #[tokio::test]
    async fn test_sqlite_row_decoded_by_storage_class() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        let row = sqlx::query("SELECT 42 AS i, 1.5 AS f, 'x' AS t, X'FF00' AS b, NULL AS n")
            .fetch_one(&pool)
            .await
            .unwrap();

        let map = row.to_json_map();
        assert_eq!(map["i"], serde_json::json!(42));
        assert_eq!(map["f"], serde_json::json!(1.5));
        assert_eq!(map["t"], serde_json::json!("x"));
        assert_eq!(map["b"], serde_json::json!("/wA="));
        assert_eq!(map["n"], JsonValue::Null);
        assert_eq!(map.len(), 5);
    }

    #[tokio::test]
    async fn test_sqlite_pragma_row_decodes() {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (id INTEGER PRIMARY KEY, s TEXT DEFAULT 'a')")
            .execute(&pool)
            .await
            .unwrap();
        let rows = sqlx::query("PRAGMA table_info('t')")
            .fetch_all(&pool)
            .await
            .unwrap();

        let first = rows[0].to_json_map();
        assert_eq!(first["name"], serde_json::json!("id"));
        assert_eq!(first["pk"], serde_json::json!(1));
        assert_eq!(first["dflt_value"], JsonValue::Null);
        assert_eq!(rows[1].to_json_map()["dflt_value"], serde_json::json!("'a'"));
    }

    #[test]
    fn test_non_finite_float_becomes_string() {
        assert_eq!(float_to_json(1.5), serde_json::json!(1.5));
        assert_eq!(float_to_json(f64::NAN), JsonValue::String("NaN".to_string()));
    }
}
