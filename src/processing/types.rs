//! Core data types and error definitions for the processing pipeline.

use std::path::PathBuf;

use crate::{
    embedding::EmbeddingClientError,
    vectors::{FilterError, VectorStoreError},
};
use thiserror::Error;

/// Errors produced while turning a document into page chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunk window of zero characters was requested.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Document could not be read from disk.
    #[error("failed to read document '{path}': {source}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Document bytes could not be parsed as a PDF.
    #[error("failed to extract text from '{path}': {message}")]
    Pdf {
        /// Document path.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

/// Errors raised while locating documents to index.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Path does not exist.
    #[error("document path not found: {0}")]
    NotFound(PathBuf),
    /// Directory traversal failed.
    #[error("failed to walk '{path}': {source}")]
    Walk {
        /// Root being walked.
        path: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },
}

/// Errors that abort indexing of a single document.
#[derive(Debug, Error)]
pub enum IndexingError {
    /// Chunk extraction failed.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// One chunk could not be embedded; nothing from the document was written.
    #[error("Failed to embed chunk '{key}': {source}")]
    Embedding {
        /// Key the chunk would have been stored under.
        key: String,
        /// Provider failure.
        #[source]
        source: EmbeddingClientError,
    },
    /// The batch upsert for the document failed.
    #[error("Vector store request failed: {0}")]
    Store(#[from] VectorStoreError),
    /// Background extraction task panicked or was cancelled.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Errors raised while emptying an index.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// Key enumeration failed before any deletion happened.
    #[error("Failed to list vectors: {0}")]
    Listing(#[source] VectorStoreError),
    /// A delete call failed; earlier deletions are not rolled back.
    #[error("Failed to delete vectors after removing {deleted}: {source}")]
    Interrupted {
        /// Keys deleted before the failure.
        deleted: usize,
        /// Store failure.
        #[source]
        source: VectorStoreError,
    },
}

/// Errors surfaced by the retrieval tool, always rendered as text rather than propagated.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Query text was empty or whitespace.
    #[error("query text must not be empty")]
    EmptyQuery,
    /// `top_k` of zero was requested.
    #[error("top_k must be greater than zero")]
    InvalidTopK,
    /// Metadata filter was rejected.
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterError),
    /// Query embedding failed.
    #[error("{0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Similarity query failed.
    #[error("{0}")]
    Store(#[from] VectorStoreError),
}

impl SearchError {
    /// Short category label used when rendering the error for an agent.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyQuery | Self::InvalidTopK | Self::Filter(_) => "InvalidInput",
            Self::Embedding(_) => "EmbeddingError",
            Self::Store(_) => "VectorStoreError",
        }
    }

    /// Whether the error was detected before any remote call.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyQuery | Self::InvalidTopK | Self::Filter(_))
    }
}

/// Summary of one successfully indexed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    /// Path the document was read from.
    pub path: PathBuf,
    /// File name used in keys and metadata.
    pub source_file: String,
    /// Pages in the document, including those without text.
    pub pages: usize,
    /// Chunks produced.
    pub chunks: usize,
    /// Vectors written in the document's batch.
    pub vectors_written: usize,
}

/// Result of indexing one document within a multi-document run.
#[derive(Debug)]
pub struct DocumentReport {
    /// Document path.
    pub path: PathBuf,
    /// Outcome or the error that aborted the document.
    pub result: Result<DocumentOutcome, IndexingError>,
}

/// Aggregate result of [`crate::processing::Indexer::index_documents`].
#[derive(Debug, Default)]
pub struct IndexingReport {
    /// Per-document results in processing order.
    pub documents: Vec<DocumentReport>,
}

impl IndexingReport {
    /// Total vectors written across successful documents.
    pub fn total_vectors(&self) -> usize {
        self.documents
            .iter()
            .filter_map(|report| report.result.as_ref().ok())
            .map(|outcome| outcome.vectors_written)
            .sum()
    }

    /// Number of documents that were aborted.
    pub fn failed(&self) -> usize {
        self.documents
            .iter()
            .filter(|report| report.result.is_err())
            .count()
    }

    /// Number of documents whose batch was committed.
    pub fn succeeded(&self) -> usize {
        self.documents.len() - self.failed()
    }
}
