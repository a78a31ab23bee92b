//! Handler for the metrics tool.

use crate::metrics::PipelineMetrics;
use rmcp::{ErrorData as McpError, model::CallToolResult};

/// Handle the `metrics` tool, returning the current pipeline counters.
pub(crate) async fn handle_metrics(metrics: &PipelineMetrics) -> Result<CallToolResult, McpError> {
    let snapshot = serde_json::to_value(metrics.snapshot())
        .map_err(|err| McpError::internal_error(err.to_string(), None))?;
    Ok(CallToolResult::structured(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_counters_in_camel_case() {
        let metrics = PipelineMetrics::new();
        metrics.record_search(true);

        let result = handle_metrics(&metrics).await.expect("metrics");
        let payload = result.structured_content.expect("structured payload");
        assert_eq!(payload["searchesServed"], 1);
        assert_eq!(payload["searchFailures"], 1);
        assert_eq!(payload["vectorsWritten"], 0);
    }
}
