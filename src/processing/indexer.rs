//! Indexing pipeline: chunk each document, embed every chunk, and upsert one batch per document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    config::Config,
    embedding::EmbeddingClient,
    metrics::PipelineMetrics,
    processing::{
        chunking::{PageReader, chunk_pages},
        metadata::{build_metadata, source_file_name, vector_key},
        types::{DocumentOutcome, DocumentReport, IndexingError, IndexingReport},
    },
    vectors::{IndexRef, VectorRecord, VectorStore},
};

/// Knobs controlling how documents are chunked and stored.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Target index.
    pub index: IndexRef,
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Byte budget for `source_text` metadata.
    pub max_metadata_bytes: usize,
}

impl IndexSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: IndexRef::new(&config.vector_bucket, &config.vector_index),
            chunk_size: config.effective_chunk_size(),
            max_metadata_bytes: config.max_metadata_bytes,
        }
    }
}

/// Progress notifications emitted while indexing.
#[derive(Debug)]
pub enum IndexProgress<'a> {
    /// Work on a document began.
    DocumentStarted {
        /// Document path.
        path: &'a Path,
    },
    /// Page text was extracted and chunked.
    ChunksExtracted {
        /// Document path.
        path: &'a Path,
        /// Pages in the document.
        pages: usize,
        /// Chunks produced.
        chunks: usize,
    },
    /// One more chunk was embedded.
    ChunkEmbedded {
        /// Document path.
        path: &'a Path,
        /// Chunks embedded so far.
        completed: usize,
        /// Chunks in the document.
        total: usize,
    },
    /// The document's batch was committed.
    DocumentIndexed(&'a DocumentOutcome),
    /// The document was aborted; nothing from it was written.
    DocumentFailed {
        /// Document path.
        path: &'a Path,
        /// Cause.
        error: &'a IndexingError,
    },
}

/// Callback receiving [`IndexProgress`] events.
pub type ProgressSink<'s> = dyn FnMut(IndexProgress<'_>) + Send + 's;

/// Sequential chunk → embed → upsert pipeline.
///
/// Holds long-lived handles to the page reader, embedding client, and vector store; construct
/// it once at process start. Every remote call is awaited before the next is issued.
pub struct Indexer {
    reader: Arc<dyn PageReader>,
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    settings: IndexSettings,
    metrics: Arc<PipelineMetrics>,
}

impl Indexer {
    /// Assemble an indexer from its collaborators.
    pub fn new(
        reader: Arc<dyn PageReader>,
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        settings: IndexSettings,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            reader,
            embedder,
            store,
            settings,
            metrics,
        }
    }

    /// Settings in effect.
    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    /// Index each document in turn. A failing document is reported and skipped; batches
    /// already committed for earlier documents are unaffected.
    pub async fn index_documents(
        &self,
        paths: &[PathBuf],
        progress: &mut ProgressSink<'_>,
    ) -> IndexingReport {
        let mut report = IndexingReport::default();

        for path in paths {
            let result = self.index_document(path, progress).await;
            match &result {
                Ok(outcome) => progress(IndexProgress::DocumentIndexed(outcome)),
                Err(error) => progress(IndexProgress::DocumentFailed { path, error }),
            }
            report.documents.push(DocumentReport {
                path: path.clone(),
                result,
            });
        }

        tracing::info!(
            index = %self.settings.index,
            documents = report.documents.len(),
            failed = report.failed(),
            vectors = report.total_vectors(),
            "Indexing run finished"
        );
        report
    }

    /// Chunk, embed, and upsert a single document.
    pub async fn index_document(
        &self,
        path: &Path,
        progress: &mut ProgressSink<'_>,
    ) -> Result<DocumentOutcome, IndexingError> {
        let result = self.run_document(path, progress).await;
        match &result {
            Ok(outcome) => {
                self.metrics.record_document(outcome.vectors_written as u64);
                tracing::info!(
                    document = %path.display(),
                    pages = outcome.pages,
                    chunks = outcome.chunks,
                    vectors = outcome.vectors_written,
                    "Document indexed"
                );
            }
            Err(error) => {
                self.metrics.record_document_failure();
                tracing::error!(document = %path.display(), error = %error, "Document aborted");
            }
        }
        result
    }

    async fn run_document(
        &self,
        path: &Path,
        progress: &mut ProgressSink<'_>,
    ) -> Result<DocumentOutcome, IndexingError> {
        progress(IndexProgress::DocumentStarted { path });
        tracing::info!(document = %path.display(), index = %self.settings.index, "Indexing document");

        let reader = Arc::clone(&self.reader);
        let owned_path = path.to_path_buf();
        let chunk_size = self.settings.chunk_size;
        let (pages, chunks) = tokio::task::spawn_blocking(move || {
            let pages = reader.read_pages(&owned_path)?;
            let chunks = chunk_pages(&pages, chunk_size)?;
            Ok::<_, IndexingError>((pages.len(), chunks))
        })
        .await
        .map_err(|err| IndexingError::Task(err.to_string()))??;

        progress(IndexProgress::ChunksExtracted {
            path,
            pages,
            chunks: chunks.len(),
        });

        let source_file = source_file_name(path);
        let total = chunks.len();
        let mut records = Vec::with_capacity(total);

        for (position, chunk) in chunks.into_iter().enumerate() {
            let key = vector_key(&source_file, chunk.page, chunk.chunk_index);
            self.metrics.record_embedding_call();
            let embedding = match self.embedder.embed(&chunk.text).await {
                Ok(embedding) => embedding,
                Err(source) => return Err(IndexingError::Embedding { key, source }),
            };
            let metadata = build_metadata(&chunk, &source_file, self.settings.max_metadata_bytes);
            records.push(VectorRecord {
                key,
                embedding,
                metadata,
            });
            progress(IndexProgress::ChunkEmbedded {
                path,
                completed: position + 1,
                total,
            });
        }

        let vectors_written = records.len();
        if vectors_written > 0 {
            self.store
                .put_vectors(&self.settings.index, records)
                .await?;
        } else {
            tracing::info!(document = %path.display(), "No extractable text; nothing to upsert");
        }

        Ok(DocumentOutcome {
            path: path.to_path_buf(),
            source_file,
            pages,
            chunks: total,
            vectors_written,
        })
    }
}
