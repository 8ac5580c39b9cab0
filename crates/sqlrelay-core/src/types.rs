//! Core types for sqlrelay

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named query parameters, keyed by placeholder name (without the colon)
pub type Params = BTreeMap<String, Value>;

/// A database value that can represent any SQL type the adapter passes through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit unsigned integer (values above `i64::MAX`)
    UInt64(u64),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// JSON value (objects passed as parameters end up here)
    Json(serde_json::Value),
    /// Array of values
    Array(Vec<Value>),
}

impl Value {
    /// Convert into the JSON shape forwarded to relay outputs
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::Int64(v) => Json::from(*v),
            Value::UInt64(v) => Json::from(*v),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Decimal(v) => Json::String(v.clone()),
            Value::String(v) => Json::String(v.clone()),
            Value::Bytes(v) => serde_json::json!({ "type": "Buffer", "data": v }),
            Value::Date(v) => Json::String(v.format("%Y-%m-%d").to_string()),
            Value::DateTime(v) => Json::String(v.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()),
            Value::Json(v) => v.clone(),
            Value::Array(v) => Json::Array(v.iter().map(Value::to_json).collect()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    n.as_f64()
                        .map(Value::Float64)
                        .unwrap_or_else(|| Value::Decimal(n.to_string()))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            object @ Json::Object(_) => Value::Json(object),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Date(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v),
            Value::Array(v) => write!(f, "[{} items]", v.len()),
        }
    }
}

/// A row from a query result
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column values
    pub values: Vec<Value>,
    /// Column names, in result-set order
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Convert to a JSON object keyed by column name.
    ///
    /// Duplicate column names collapse to the last value, matching how a
    /// keyed row behaves in the host runtime.
    pub fn to_json(&self) -> serde_json::Value {
        let object: serde_json::Map<String, serde_json::Value> = self
            .columns
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(object)
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnMeta {
    /// Column name
    #[serde(default)]
    pub name: String,
    /// Data type (database-specific string)
    #[serde(default)]
    pub data_type: String,
    /// Column ordinal position (0-based)
    #[serde(default)]
    pub ordinal: usize,
}

/// The first result set produced by a statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    /// Column metadata; empty when the statement produced no result set
    pub columns: Vec<ColumnMeta>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Rows affected (for DML statements)
    pub affected_rows: u64,
    /// Auto-increment id generated by the statement, if any
    pub last_insert_id: Option<u64>,
    /// Number of warnings reported by the server
    pub warnings: u16,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Whether the statement produced a result set (SELECT, SHOW, ...)
    pub fn has_result_set(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Convert into the payload forwarded by the relay.
    ///
    /// Result sets become an array of row objects. Statements without a
    /// result set become a summary object.
    pub fn to_payload(&self) -> serde_json::Value {
        if self.has_result_set() {
            serde_json::Value::Array(self.rows.iter().map(Row::to_json).collect())
        } else {
            serde_json::json!({
                "affectedRows": self.affected_rows,
                "insertId": self.last_insert_id.unwrap_or(0),
                "warningStatus": self.warnings,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_value_from_json_scalars() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!(true)), Value::Bool(true));
        assert_eq!(Value::from(json!(5)), Value::Int64(5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::UInt64(u64::MAX));
        assert_eq!(Value::from(json!(1.5)), Value::Float64(1.5));
        assert_eq!(Value::from(json!("a")), Value::String("a".into()));
    }

    #[test]
    fn test_value_from_json_nested() {
        assert_eq!(
            Value::from(json!([1, "b"])),
            Value::Array(vec![Value::Int64(1), Value::String("b".into())])
        );
        assert_eq!(
            Value::from(json!({"k": 1})),
            Value::Json(json!({"k": 1}))
        );
    }

    #[test]
    fn test_row_to_json() {
        let row = Row::new(
            vec!["id".into(), "name".into()],
            vec![Value::Int64(1), Value::String("alice".into())],
        );
        assert_eq!(row.to_json(), json!({"id": 1, "name": "alice"}));
        assert_eq!(row.get_by_name("name"), Some(&Value::String("alice".into())));
        assert_eq!(row.get_by_name("missing"), None);
    }

    #[test]
    fn test_payload_for_result_set() {
        let result = QueryResult {
            columns: vec![ColumnMeta {
                name: "id".into(),
                data_type: "LONGLONG".into(),
                ordinal: 0,
            }],
            rows: vec![
                Row::new(vec!["id".into()], vec![Value::Int64(1)]),
                Row::new(vec!["id".into()], vec![Value::Int64(2)]),
            ],
            ..QueryResult::default()
        };
        assert_eq!(result.to_payload(), json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_payload_for_empty_result_set_is_empty_array() {
        let result = QueryResult {
            columns: vec![ColumnMeta {
                name: "id".into(),
                ..ColumnMeta::default()
            }],
            ..QueryResult::default()
        };
        assert_eq!(result.to_payload(), json!([]));
    }

    #[test]
    fn test_payload_for_statement_without_result_set() {
        let result = QueryResult {
            affected_rows: 3,
            last_insert_id: Some(42),
            ..QueryResult::default()
        };
        assert_eq!(
            result.to_payload(),
            json!({"affectedRows": 3, "insertId": 42, "warningStatus": 0})
        );
    }

    #[test]
    fn test_bytes_serialize_like_a_buffer() {
        let value = Value::Bytes(vec![1, 2]);
        assert_eq!(value.to_json(), json!({"type": "Buffer", "data": [1, 2]}));
    }
}
