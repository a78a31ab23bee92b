//! Metadata filter helpers for similarity queries.

use serde_json::{Map, Value, json};
use thiserror::Error;

/// Reasons a metadata filter is rejected before any request is sent.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// Filter key was empty or whitespace.
    #[error("filter keys must be non-empty")]
    EmptyKey,
    /// Filter value was not a string, number, or boolean.
    #[error("unsupported filter value for '{key}': {value}")]
    UnsupportedValue {
        /// Metadata key the value was supplied for.
        key: String,
        /// Offending value, rendered as JSON.
        value: String,
    },
    /// Command-line filter did not have the `key=value` shape.
    #[error("filters must look like key=value (got '{0}')")]
    Malformed(String),
}

/// Compose an equality filter document from `(key, value)` pairs.
///
/// A single pair becomes `{"key": value}`; several pairs are combined with `$and`. Returns
/// `None` when no pairs are supplied.
pub fn build_metadata_filter(pairs: &[(String, Value)]) -> Result<Option<Value>, FilterError> {
    let mut clauses: Vec<Value> = Vec::with_capacity(pairs.len());

    for (key, value) in pairs {
        let key = key.trim();
        if key.is_empty() {
            return Err(FilterError::EmptyKey);
        }
        if !is_supported_value(value) {
            return Err(FilterError::UnsupportedValue {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        let mut clause = Map::new();
        clause.insert(key.to_string(), value.clone());
        clauses.push(Value::Object(clause));
    }

    match clauses.len() {
        0 => Ok(None),
        1 => Ok(clauses.pop()),
        _ => Ok(Some(json!({ "$and": clauses }))),
    }
}

/// Parse a `key=value` argument. Values that read as JSON scalars keep their type; anything
/// else is treated as a plain string.
pub fn parse_filter_arg(raw: &str) -> Result<(String, Value), FilterError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| FilterError::Malformed(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(FilterError::EmptyKey);
    }

    let value = value.trim();
    let parsed = match serde_json::from_str::<Value>(value) {
        Ok(scalar @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => scalar,
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), parsed))
}

/// Check whether a stored metadata map satisfies an equality filter document.
pub(crate) fn matches_filter(metadata: &Map<String, Value>, filter: &Value) -> bool {
    let Some(object) = filter.as_object() else {
        return false;
    };
    object.iter().all(|(key, expected)| {
        if key == "$and" {
            return expected
                .as_array()
                .map(|clauses| clauses.iter().all(|clause| matches_filter(metadata, clause)))
                .unwrap_or(false);
        }
        metadata.get(key) == Some(expected)
    })
}

fn is_supported_value(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pair_builds_flat_filter() {
        let filter = build_metadata_filter(&[("genre".into(), json!("scifi"))])
            .expect("valid filter")
            .expect("filter present");
        assert_eq!(filter, json!({ "genre": "scifi" }));
    }

    #[test]
    fn multiple_pairs_are_combined_with_and() {
        let filter = build_metadata_filter(&[
            ("genre".into(), json!("scifi")),
            ("page_number".into(), json!(3)),
        ])
        .expect("valid filter")
        .expect("filter present");
        assert_eq!(
            filter,
            json!({ "$and": [ { "genre": "scifi" }, { "page_number": 3 } ] })
        );
    }

    #[test]
    fn returns_none_when_empty() {
        assert_eq!(build_metadata_filter(&[]), Ok(None));
    }

    #[test]
    fn rejects_unsupported_values() {
        let error = build_metadata_filter(&[("genre".into(), json!(["a", "b"]))]).unwrap_err();
        assert!(matches!(error, FilterError::UnsupportedValue { .. }));

        let error = build_metadata_filter(&[("genre".into(), Value::Null)]).unwrap_err();
        assert!(matches!(error, FilterError::UnsupportedValue { .. }));

        let error = build_metadata_filter(&[("  ".into(), json!("x"))]).unwrap_err();
        assert_eq!(error, FilterError::EmptyKey);
    }

    #[test]
    fn parse_filter_arg_keeps_scalar_types() {
        assert_eq!(
            parse_filter_arg("page_number=3"),
            Ok(("page_number".into(), json!(3)))
        );
        assert_eq!(
            parse_filter_arg("genre=scifi"),
            Ok(("genre".into(), json!("scifi")))
        );
        assert_eq!(
            parse_filter_arg("draft=true"),
            Ok(("draft".into(), json!(true)))
        );
        assert_eq!(
            parse_filter_arg("tags=[1,2]"),
            Ok(("tags".into(), json!("[1,2]")))
        );
        assert!(matches!(
            parse_filter_arg("genre"),
            Err(FilterError::Malformed(_))
        ));
    }

    #[test]
    fn matches_filter_handles_nested_and() {
        let mut metadata = Map::new();
        metadata.insert("genre".into(), json!("scifi"));
        metadata.insert("page_number".into(), json!(3));

        assert!(matches_filter(&metadata, &json!({ "genre": "scifi" })));
        assert!(!matches_filter(&metadata, &json!({ "genre": "drama" })));
        assert!(matches_filter(
            &metadata,
            &json!({ "$and": [ { "genre": "scifi" }, { "page_number": 3 } ] })
        ));
        assert!(!matches_filter(
            &metadata,
            &json!({ "$and": [ { "genre": "scifi" }, { "page_number": 4 } ] })
        ));
    }
}
