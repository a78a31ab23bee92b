//! Handler for the `search` tool.
//!
//! Malformed argument shapes are protocol errors; everything else (blank query, zero `top_k`,
//! unsupported filter values, backend failures) comes back as a text result.

use crate::{
    mcp::handlers::{move_alias, parse_arguments_value},
    processing::{Retriever, SearchRequest},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content, JsonObject},
};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Handle the `search` tool by running a top-k similarity query.
pub(crate) async fn handle_search(
    retriever: &Retriever,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SearchToolRequest = parse_arguments_value(normalize_search_arguments(arguments))?;
    let outcome = retriever.search(args.into_request()).await;
    let text = outcome.text();
    if outcome.is_error() {
        Ok(CallToolResult::error(vec![Content::text(text)]))
    } else {
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

/// Raw search request payload accepted from MCP clients.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SearchToolRequest {
    /// Natural language query text to embed.
    #[serde(default)]
    pub(crate) query_text: String,
    /// Optional result count.
    #[serde(default)]
    pub(crate) top_k: Option<usize>,
    /// Optional exact-match metadata constraints.
    #[serde(default)]
    pub(crate) filters: Option<Map<String, Value>>,
}

impl SearchToolRequest {
    fn into_request(self) -> SearchRequest {
        SearchRequest {
            query_text: self.query_text,
            top_k: self.top_k,
            filters: self.filters.unwrap_or_default().into_iter().collect(),
        }
    }
}

/// Normalize search arguments, honoring the `query` and `k` aliases.
pub(crate) fn normalize_search_arguments(arguments: Option<JsonObject>) -> Value {
    let mut map = arguments.unwrap_or_default();
    move_alias(&mut map, "query", "query_text");
    move_alias(&mut map, "k", "top_k");
    Value::Object(map)
}
