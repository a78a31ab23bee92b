//! MCP server entrypoint (stdio transport).
//!
//! Serves the `search` tool over stdio for agent hosts. Shares configuration with the
//! `ragindex` CLI; logs go to stderr so stdout carries only protocol frames.

use anyhow::{Context, Result};
use ragindex::{
    config,
    embedding::build_embedding_client,
    logging,
    mcp::RagIndexMcpServer,
    metrics::PipelineMetrics,
    processing::{Retriever, SearchSettings},
    vectors::build_vector_store,
};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let config = config::init_config().context("failed to load configuration")?;

    let metrics = Arc::new(PipelineMetrics::new());
    let retriever = Arc::new(Retriever::new(
        build_embedding_client(config).context("failed to build embedding client")?,
        build_vector_store(config).context("failed to build vector store client")?,
        SearchSettings::from_config(config),
        metrics.clone(),
    ));
    let server = RagIndexMcpServer::new(retriever, metrics);

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
