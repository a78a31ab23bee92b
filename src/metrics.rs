use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing indexing, purge, and search activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_indexed: AtomicU64,
    documents_failed: AtomicU64,
    vectors_written: AtomicU64,
    embedding_calls: AtomicU64,
    vectors_deleted: AtomicU64,
    searches_served: AtomicU64,
    search_failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document whose batch was committed with `vectors` entries.
    pub fn record_document(&self, vectors: u64) {
        self.documents_indexed.fetch_add(1, Ordering::Relaxed);
        self.vectors_written.fetch_add(vectors, Ordering::Relaxed);
    }

    /// Record a document that was aborted.
    pub fn record_document_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one request to the embedding service.
    pub fn record_embedding_call(&self) {
        self.embedding_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record keys removed from an index.
    pub fn record_deleted(&self, keys: u64) {
        self.vectors_deleted.fetch_add(keys, Ordering::Relaxed);
    }

    /// Record a search answered by the retrieval tool, successful or not.
    pub fn record_search(&self, failed: bool) {
        self.searches_served.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.search_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            vectors_written: self.vectors_written.load(Ordering::Relaxed),
            embedding_calls: self.embedding_calls.load(Ordering::Relaxed),
            vectors_deleted: self.vectors_deleted.load(Ordering::Relaxed),
            searches_served: self.searches_served.load(Ordering::Relaxed),
            search_failures: self.search_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Documents whose batch was committed.
    pub documents_indexed: u64,
    /// Documents aborted by an error.
    pub documents_failed: u64,
    /// Vectors written across committed documents.
    pub vectors_written: u64,
    /// Requests issued to the embedding service, including query embeddings.
    pub embedding_calls: u64,
    /// Keys removed by purges.
    pub vectors_deleted: u64,
    /// Searches answered by the retrieval tool.
    pub searches_served: u64,
    /// Searches that produced an error result.
    pub search_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_vectors() {
        let metrics = PipelineMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);
        metrics.record_document_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_indexed, 2);
        assert_eq!(snapshot.vectors_written, 5);
        assert_eq!(snapshot.documents_failed, 1);
    }

    #[test]
    fn search_failures_are_a_subset_of_searches() {
        let metrics = PipelineMetrics::new();
        metrics.record_search(false);
        metrics.record_search(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.searches_served, 2);
        assert_eq!(snapshot.search_failures, 1);
        assert_eq!(snapshot.vectors_deleted, 0);
    }
}
