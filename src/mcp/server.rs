//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json},
        handlers::{metrics::handle_metrics, search::handle_search},
        registry, schemas,
    },
    metrics::PipelineMetrics,
    processing::Retriever,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool, ToolAnnotations,
    },
};

const SETTINGS_URI: &str = "mcp://settings";
const USAGE_URI: &str = "mcp://usage";

/// MCP server exposing read-only retrieval over an indexed document collection.
#[derive(Clone)]
pub struct RagIndexMcpServer {
    retriever: Arc<Retriever>,
    metrics: Arc<PipelineMetrics>,
    registry: Arc<registry::Registry>,
}

impl RagIndexMcpServer {
    /// Create a server answering tool calls with `retriever`.
    ///
    /// `metrics` should be the accumulator the retriever records into.
    pub fn new(retriever: Arc<Retriever>, metrics: Arc<PipelineMetrics>) -> Self {
        let mut registry = registry::Registry::default();
        registry.register_resource(SETTINGS_URI, resource_settings);
        registry.register_resource(USAGE_URI, resource_usage);

        registry.register_tool("search", tool_search);
        registry.register_tool("metrics", tool_metrics);

        Self {
            retriever,
            metrics,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        let search_schema = Arc::new(schemas::search_input_schema(self.retriever.settings()));
        vec![
            Tool {
                name: Cow::Borrowed("search"),
                title: Some("Search Documents".to_string()),
                description: Some(Cow::Borrowed(
                    "Retrieve the passages most similar to a question from the indexed PDF collection. Returns one line per hit: id, distance, and metadata including the source text.",
                )),
                input_schema: search_schema,
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Search Documents")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("metrics"),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Report search counts and failures served by this process.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description = Some("Index queried and top_k defaults".into());

        let mut usage = RawResource::new(USAGE_URI, "usage");
        usage.description = Some("How to phrase searches and read the results".into());

        vec![settings.no_annotation(), usage.no_annotation()]
    }
}

fn resource_settings(
    server: &RagIndexMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let payload = SettingsSnapshot::from(server.retriever.settings());
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn resource_usage(
    _server: &RagIndexMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        let usage = serde_json::json!({
            "title": "ragindex MCP Usage",
            "policy": [
                "Ask focused questions; each search embeds query_text once.",
                "Read `source_text` in each hit's metadata for the passage itself.",
                "Lower distance means closer; results are already ordered.",
                "Narrow with filters such as {\"source_file\": \"guide.pdf\"} or {\"page_number\": 3}.",
            ],
            "output": "id=<key> distance=<d> metadata=<json>, one hit per line, or \"No similar content found.\"",
        });
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage, USAGE_URI),
            )],
        })
    })
}

fn tool_search(server: &RagIndexMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let retriever = server.retriever.clone();
    Box::pin(async move { handle_search(&retriever, request.arguments).await })
}

fn tool_metrics(
    server: &RagIndexMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let metrics = server.metrics.clone();
    Box::pin(async move { handle_metrics(&metrics).await })
}

impl ServerHandler for RagIndexMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "ragindex".to_string();
        implementation.title = Some("ragindex MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use `search` to ground answers in the indexed PDF collection. Each hit carries the page text in metadata.source_text.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resources.get(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
