//! Top-k similarity search exposed to agents as a tool.
//!
//! [`Retriever::search`] never returns an error: every failure becomes a human-readable
//! string so the calling agent can relay it.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::Config,
    embedding::EmbeddingClient,
    metrics::PipelineMetrics,
    processing::types::SearchError,
    vectors::{IndexRef, QueryHit, QueryRequest, VectorStore, build_metadata_filter},
};

/// Text returned when the index has no matching vectors.
pub const NO_RESULTS: &str = "No similar content found.";

/// Search defaults and limits.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Index queried.
    pub index: IndexRef,
    /// `top_k` used when the caller omits it.
    pub default_top_k: usize,
    /// Upper bound applied to caller-supplied `top_k`.
    pub max_top_k: usize,
}

impl SearchSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: IndexRef::new(&config.vector_bucket, &config.vector_index),
            default_top_k: config.search_default_top_k,
            max_top_k: config.search_max_top_k,
        }
    }

    fn resolve_top_k(&self, requested: Option<usize>) -> Result<usize, SearchError> {
        match requested {
            Some(0) => Err(SearchError::InvalidTopK),
            Some(top_k) => Ok(top_k.min(self.max_top_k)),
            None => Ok(self.default_top_k.min(self.max_top_k)),
        }
    }
}

/// A single retrieval request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Natural-language query.
    pub query_text: String,
    /// Number of hits wanted; the configured default when absent.
    pub top_k: Option<usize>,
    /// Exact-match metadata constraints, combined with AND.
    pub filters: Vec<(String, Value)>,
}

impl SearchRequest {
    /// Request with default size and no filters.
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Self::default()
        }
    }
}

/// Result of a search, convertible to the tool's text payload.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Hits in ascending distance order.
    Hits(Vec<QueryHit>),
    /// The query succeeded but matched nothing.
    NoResults,
    /// The search failed.
    Failed(SearchError),
}

impl SearchOutcome {
    /// Render the outcome as tool output.
    pub fn text(&self) -> String {
        match self {
            Self::Hits(hits) => format_hits(hits),
            Self::NoResults => NO_RESULTS.to_string(),
            Self::Failed(error) => format!("Vector search error: {}: {error}", error.kind()),
        }
    }

    /// Whether the outcome is a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Embeds queries and runs similarity searches against one index.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    settings: SearchSettings,
    metrics: Arc<PipelineMetrics>,
}

impl Retriever {
    /// Assemble a retriever from its collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        settings: SearchSettings,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
            metrics,
        }
    }

    /// Settings in effect.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Embed the query and return the nearest stored chunks.
    ///
    /// Input problems are rejected before any remote call is made.
    pub async fn search(&self, request: SearchRequest) -> SearchOutcome {
        let outcome = match self.run(request).await {
            Ok(hits) if hits.is_empty() => SearchOutcome::NoResults,
            Ok(hits) => SearchOutcome::Hits(hits),
            Err(error) => {
                tracing::warn!(kind = error.kind(), error = %error, "Vector search failed");
                SearchOutcome::Failed(error)
            }
        };
        self.metrics.record_search(outcome.is_error());
        outcome
    }

    async fn run(&self, request: SearchRequest) -> Result<Vec<QueryHit>, SearchError> {
        if request.query_text.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let top_k = self.settings.resolve_top_k(request.top_k)?;
        let filter = build_metadata_filter(&request.filters)?;

        self.metrics.record_embedding_call();
        let vector = self.embedder.embed(&request.query_text).await?;

        let hits = self
            .store
            .query_vectors(
                &self.settings.index,
                QueryRequest {
                    vector,
                    top_k,
                    return_distance: true,
                    return_metadata: true,
                    filter,
                },
            )
            .await?;

        tracing::info!(
            index = %self.settings.index,
            top_k,
            hits = hits.len(),
            "Vector search served"
        );
        Ok(hits)
    }
}

/// Render hits one per line as `id=<key> distance=<d> metadata=<json>`.
pub fn format_hits(hits: &[QueryHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "id={} distance={} metadata={}",
                hit.id,
                format_distance(hit.distance.as_ref()),
                Value::Object(hit.metadata.clone())
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_distance(distance: Option<&Value>) -> String {
    match distance {
        Some(Value::String(text)) => text.clone(),
        Some(value) => match value.as_f64() {
            Some(number) => format!("{number:.4}"),
            None => value.to_string(),
        },
        None => Value::Null.to_string(),
    }
}
