//! MySQL literal escaping
//!
//! Formats values the way the MySQL client libraries do when splicing
//! parameters into statement text: strings are single-quoted with
//! backslash escapes, arrays become comma lists, objects become
//! `` `key` = value `` pairs for `SET` clauses.

use sqlrelay_core::Value;

/// Escape a value for SQL literal inclusion
pub fn escape_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => if *v { "true" } else { "false" }.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::UInt64(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::Decimal(v) => v.clone(),
        Value::String(v) => escape_string(v),
        Value::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{:02x}", b)).collect();
            format!("X'{}'", hex)
        }
        Value::Date(v) => format!("'{}'", v.format("%Y-%m-%d")),
        Value::DateTime(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.3f")),
        Value::Array(items) => array_to_list(items),
        Value::Json(json) => json_to_literal(json),
    }
}

/// Quote an identifier with backticks, doubling embedded backticks
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

// Nested arrays become parenthesized groups, for `IN ((1, 2), (3, 4))`
fn array_to_list(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Array(inner) => format!("({})", array_to_list(inner)),
            other => escape_literal(other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn json_to_literal(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    // Nested objects have no SQL shape; send them as JSON text
                    serde_json::Value::Object(_) => escape_string(&value.to_string()),
                    other => escape_literal(&Value::from(other.clone())),
                };
                format!("{} = {}", escape_identifier(key), value)
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => escape_literal(&Value::from(other.clone())),
    }
}
