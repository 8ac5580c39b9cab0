//! Named parameter formatting
//!
//! Replaces `:name` placeholders in a statement with escaped literals. The
//! statement is otherwise sent as-is: placeholders inside string literals or
//! comments are not special-cased, and a placeholder whose name is missing
//! from the parameter map is left in the text verbatim.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{Params, Value};

static COLON_NAMED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("valid regex"));

/// Substitute `:name` placeholders with `escape(params[name])`.
///
/// Returns the statement unchanged when `params` is `None`.
///
/// # Example
///
/// ```
/// use sqlrelay_core::{Params, Value, format_named};
///
/// let mut params = Params::new();
/// params.insert("id".to_string(), Value::Int64(5));
///
/// let sql = format_named("SELECT * FROM t WHERE id = :id", Some(&params), |v| v.to_string());
/// assert_eq!(sql, "SELECT * FROM t WHERE id = 5");
/// ```
pub fn format_named<F>(statement: &str, params: Option<&Params>, escape: F) -> String
where
    F: Fn(&Value) -> String,
{
    let Some(params) = params else {
        return statement.to_string();
    };

    COLON_NAMED_REGEX
        .replace_all(statement, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => escape(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names in `statement` that have no entry in `params`.
///
/// These pass through [`format_named`] untouched; callers use this to log
/// likely typos.
pub fn unmatched_placeholders(statement: &str, params: &Params) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for caps in COLON_NAMED_REGEX.captures_iter(statement) {
        let name = &caps[1];
        if !params.contains_key(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quote(value: &Value) -> String {
        match value {
            Value::String(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_substitutes_present_key() {
        let p = params(&[("id", Value::Int64(5))]);
        assert_eq!(
            format_named("SELECT * FROM t WHERE id = :id", Some(&p), quote),
            "SELECT * FROM t WHERE id = 5"
        );
    }

    #[test]
    fn test_missing_key_passes_through_verbatim() {
        let p = params(&[("id", Value::Int64(5))]);
        assert_eq!(
            format_named("SELECT :id, :idd, :other", Some(&p), quote),
            "SELECT 5, :idd, :other"
        );
    }

    #[test]
    fn test_no_params_leaves_statement_untouched() {
        assert_eq!(
            format_named("SELECT :id", None, quote),
            "SELECT :id"
        );
    }

    #[test]
    fn test_repeated_placeholder_substituted_each_time() {
        let p = params(&[("name", Value::String("bob".into()))]);
        assert_eq!(
            format_named("SELECT :name, :name", Some(&p), quote),
            "SELECT 'bob', 'bob'"
        );
    }

    #[test]
    fn test_numeric_and_underscore_names() {
        let p = params(&[("1", Value::Int64(1)), ("a_b", Value::Int64(2))]);
        assert_eq!(
            format_named("VALUES (:1, :a_b)", Some(&p), quote),
            "VALUES (1, 2)"
        );
    }

    #[test]
    fn test_placeholders_in_literals_are_not_special() {
        let p = params(&[("x", Value::Int64(1))]);
        assert_eq!(
            format_named("SELECT ':x'", Some(&p), quote),
            "SELECT '1'"
        );
    }

    #[test]
    fn test_unmatched_placeholders() {
        let p = params(&[("id", Value::Int64(5))]);
        assert_eq!(
            unmatched_placeholders("SELECT :id, :typo, :typo, :other", &p),
            vec!["typo".to_string(), "other".to_string()]
        );
        assert!(unmatched_placeholders("SELECT :id", &p).is_empty());
    }
}
