//! Formatting helpers shared across MCP handlers and resources.

use crate::processing::SearchSettings;
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Payload of the `settings` resource.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SettingsSnapshot {
    /// Vector bucket queried by `search`.
    pub(crate) vector_bucket: String,
    /// Vector index queried by `search`.
    pub(crate) vector_index: String,
    /// Search limits.
    pub(crate) search: SearchLimitsSnapshot,
}

/// Top-k limits advertised to clients.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchLimitsSnapshot {
    /// `top_k` applied when callers omit it.
    pub(crate) default_top_k: usize,
    /// Largest `top_k` honoured; larger requests are clamped.
    pub(crate) max_top_k: usize,
}

impl From<&SearchSettings> for SettingsSnapshot {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            vector_bucket: settings.index.bucket.clone(),
            vector_index: settings.index.index.clone(),
            search: SearchLimitsSnapshot {
                default_top_k: settings.default_top_k,
                max_top_k: settings.max_top_k,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::IndexRef;
    use serde_json::json;

    #[test]
    fn settings_snapshot_uses_camel_case() {
        let snapshot = SettingsSnapshot::from(&SearchSettings {
            index: IndexRef::new("docs-bucket", "docs-index"),
            default_top_k: 3,
            max_top_k: 30,
        });

        assert_eq!(
            serde_json::to_value(&snapshot).expect("serialize"),
            json!({
                "vectorBucket": "docs-bucket",
                "vectorIndex": "docs-index",
                "search": { "defaultTopK": 3, "maxTopK": 30 }
            })
        );
    }
}
