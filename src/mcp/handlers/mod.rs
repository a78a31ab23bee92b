//! Tool handlers for the MCP server.

use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod metrics;
pub mod search;

/// Deserialize arguments represented as a JSON value into the target type.
pub(crate) fn parse_arguments_value<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value)
        .map_err(|err| McpError::invalid_params(format!("Invalid arguments: {err}"), None))
}

/// Rename `alias` to `canonical` unless the canonical key is already present.
pub(crate) fn move_alias(map: &mut JsonObject, alias: &str, canonical: &str) {
    if let Some(value) = map.remove(alias) {
        if map.contains_key(canonical) {
            tracing::debug!(
                alias = alias,
                canonical = canonical,
                "Alias ignored because canonical key provided"
            );
        } else {
            map.insert(canonical.to_string(), value);
        }
    }
}
