//! Shared types used by vector store clients and helpers.

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with a vector store.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid vector store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store responded with an unexpected status code.
    #[error("Unexpected vector store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The store rejected the request before performing it.
    #[error("Vector store rejected the request: {0}")]
    Rejected(String),
}

/// Address of a similarity-search collection: a named index inside a vector bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexRef {
    /// Vector bucket name.
    pub bucket: String,
    /// Index name inside the bucket.
    pub index: String,
}

impl IndexRef {
    /// Build an index reference from its bucket and index names.
    pub fn new(bucket: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            index: index.into(),
        }
    }
}

impl std::fmt::Display for IndexRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.index)
    }
}

/// Vector plus metadata, upserted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Unique, deterministic key.
    pub key: String,
    /// Embedding values.
    pub embedding: Vec<f32>,
    /// Filterable metadata stored alongside the vector.
    pub metadata: Map<String, Value>,
}

/// Parameters for a top-k similarity query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Query embedding.
    pub vector: Vec<f32>,
    /// Maximum number of hits to return.
    pub top_k: usize,
    /// Ask the store to include distances.
    pub return_distance: bool,
    /// Ask the store to include metadata.
    pub return_metadata: bool,
    /// Optional metadata filter document.
    pub filter: Option<Value>,
}

/// Single hit returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    /// Key of the matched vector.
    pub id: String,
    /// Distance reported by the store, kept verbatim.
    pub distance: Option<Value>,
    /// Metadata reported by the store.
    pub metadata: Map<String, Value>,
}

/// One page of a key listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys on this page.
    pub keys: Vec<String>,
    /// Continuation token for the next page, absent on the last page.
    pub next_token: Option<String>,
}
