//! Vector store integration.
//!
//! [`VectorStore`] is the seam between the pipeline and the managed similarity-search service.
//! [`S3VectorsClient`] speaks the hosted JSON API; [`InMemoryVectorStore`] is a deterministic
//! stand-in used for tests and offline dry runs.

pub mod client;
pub mod filters;
/// Streaming helpers for paginated key listings.
pub mod listing;
pub mod memory;
pub mod types;

pub use client::S3VectorsClient;
pub use filters::{FilterError, build_metadata_filter, parse_filter_arg};
pub use listing::stream_keys;
pub use memory::{InMemoryVectorStore, StoreCall, StoreOperation};
pub use types::{IndexRef, ListPage, QueryHit, QueryRequest, VectorRecord, VectorStoreError};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;

/// Capabilities required from a vector index backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite `records` by key.
    async fn put_vectors(
        &self,
        index: &IndexRef,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorStoreError>;

    /// Return up to `query.top_k` hits ordered by ascending distance.
    async fn query_vectors(
        &self,
        index: &IndexRef,
        query: QueryRequest,
    ) -> Result<Vec<QueryHit>, VectorStoreError>;

    /// Fetch one page of keys, starting after `next_token` when supplied.
    async fn list_vectors(
        &self,
        index: &IndexRef,
        next_token: Option<String>,
    ) -> Result<ListPage, VectorStoreError>;

    /// Remove `keys` from the index.
    async fn delete_vectors(
        &self,
        index: &IndexRef,
        keys: Vec<String>,
    ) -> Result<(), VectorStoreError>;
}

/// Build the HTTP-backed vector store described by the configuration.
pub fn build_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    Ok(Arc::new(S3VectorsClient::new(config)?))
}
