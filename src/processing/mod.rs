//! Document processing pipeline: discovery, chunking, indexing, retrieval, and purge.

pub mod chunking;
pub mod documents;
mod indexer;
pub mod metadata;
mod purge;
mod retriever;
pub mod types;

pub use chunking::{Chunk, PageReader, PdfPageReader, extract_chunks, split_text_by_length};
pub use documents::discover_documents;
pub use indexer::{IndexProgress, IndexSettings, Indexer, ProgressSink};
pub use metadata::{trim_to_max_bytes, vector_key};
pub use purge::{PurgeSettings, purge_index};
pub use retriever::{
    NO_RESULTS, Retriever, SearchOutcome, SearchRequest, SearchSettings, format_hits,
};
pub use types::{
    ChunkingError, DiscoveryError, DocumentOutcome, DocumentReport, IndexingError,
    IndexingReport, PurgeError, SearchError,
};
