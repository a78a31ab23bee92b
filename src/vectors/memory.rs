//! In-process vector store with deterministic ordering.
//!
//! Keys are kept in a `BTreeMap`, queries rank by cosine distance (ties broken by key), and
//! listings paginate in key order. Every call is recorded so tests can assert on traffic.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::VectorStore;
use super::filters::matches_filter;
use super::types::{IndexRef, ListPage, QueryHit, QueryRequest, VectorRecord, VectorStoreError};

const DEFAULT_PAGE_SIZE: usize = 500;

/// Request observed by an [`InMemoryVectorStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `put_vectors` with the submitted keys, in order.
    Put {
        /// Keys in the batch.
        keys: Vec<String>,
    },
    /// `query_vectors` with its requested size and filter.
    Query {
        /// Requested hit count.
        top_k: usize,
        /// Filter document, if any.
        filter: Option<Value>,
    },
    /// `list_vectors` with the continuation token supplied.
    List {
        /// Token passed by the caller.
        next_token: Option<String>,
    },
    /// `delete_vectors` with the submitted keys.
    Delete {
        /// Keys in the batch.
        keys: Vec<String>,
    },
}

/// Operation kinds that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `put_vectors`.
    Put,
    /// `query_vectors`.
    Query,
    /// `list_vectors`.
    List,
    /// `delete_vectors`.
    Delete,
}

#[derive(Debug, Clone)]
struct StoredVector {
    embedding: Vec<f32>,
    metadata: Map<String, Value>,
}

#[derive(Default)]
struct State {
    indexes: BTreeMap<IndexRef, BTreeMap<String, StoredVector>>,
    calls: Vec<StoreCall>,
    failing: HashSet<StoreOperation>,
}

/// Deterministic in-memory implementation of [`VectorStore`].
pub struct InMemoryVectorStore {
    state: Mutex<State>,
    page_size: usize,
}

impl InMemoryVectorStore {
    /// Create an empty store with the default listing page size.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store that returns at most `page_size` keys per listing page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    /// Make every subsequent call of `operation` fail until [`Self::clear_failures`] is called.
    pub fn fail_operation(&self, operation: StoreOperation) {
        self.lock().failing.insert(operation);
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }

    /// Calls observed so far, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Keys currently stored in `index`, in key order.
    pub fn keys(&self, index: &IndexRef) -> Vec<String> {
        self.lock()
            .indexes
            .get(index)
            .map(|vectors| vectors.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Metadata stored under `key`, if present.
    pub fn metadata(&self, index: &IndexRef, key: &str) -> Option<Map<String, Value>> {
        self.lock()
            .indexes
            .get(index)
            .and_then(|vectors| vectors.get(key))
            .map(|stored| stored.metadata.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn injected(operation: StoreOperation) -> VectorStoreError {
    VectorStoreError::Rejected(format!("injected {operation:?} failure"))
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (norm_a * norm_b)).max(0.0)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn put_vectors(
        &self,
        index: &IndexRef,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorStoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Put {
            keys: records.iter().map(|record| record.key.clone()).collect(),
        });
        if state.failing.contains(&StoreOperation::Put) {
            return Err(injected(StoreOperation::Put));
        }

        let vectors = state.indexes.entry(index.clone()).or_default();
        let expected = vectors
            .values()
            .next()
            .map(|stored| stored.embedding.len())
            .or_else(|| records.first().map(|record| record.embedding.len()));
        if let Some(expected) = expected
            && let Some(bad) = records
                .iter()
                .find(|record| record.embedding.len() != expected)
        {
            return Err(VectorStoreError::Rejected(format!(
                "vector '{}' has dimension {}, index expects {expected}",
                bad.key,
                bad.embedding.len()
            )));
        }

        for record in records {
            vectors.insert(
                record.key,
                StoredVector {
                    embedding: record.embedding,
                    metadata: record.metadata,
                },
            );
        }
        Ok(())
    }

    async fn query_vectors(
        &self,
        index: &IndexRef,
        query: QueryRequest,
    ) -> Result<Vec<QueryHit>, VectorStoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Query {
            top_k: query.top_k,
            filter: query.filter.clone(),
        });
        if state.failing.contains(&StoreOperation::Query) {
            return Err(injected(StoreOperation::Query));
        }

        let Some(vectors) = state.indexes.get(index) else {
            return Ok(Vec::new());
        };

        let mut ranked: Vec<(f64, &String, &StoredVector)> = vectors
            .iter()
            .filter(|(_, stored)| {
                query
                    .filter
                    .as_ref()
                    .map(|filter| matches_filter(&stored.metadata, filter))
                    .unwrap_or(true)
            })
            .map(|(key, stored)| {
                (cosine_distance(&query.vector, &stored.embedding), key, stored)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        ranked.truncate(query.top_k);

        Ok(ranked
            .into_iter()
            .map(|(distance, key, stored)| QueryHit {
                id: key.clone(),
                distance: query.return_distance.then(|| Value::from(distance)),
                metadata: if query.return_metadata {
                    stored.metadata.clone()
                } else {
                    Map::new()
                },
            })
            .collect())
    }

    async fn list_vectors(
        &self,
        index: &IndexRef,
        next_token: Option<String>,
    ) -> Result<ListPage, VectorStoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::List {
            next_token: next_token.clone(),
        });
        if state.failing.contains(&StoreOperation::List) {
            return Err(injected(StoreOperation::List));
        }

        let Some(vectors) = state.indexes.get(index) else {
            return Ok(ListPage::default());
        };

        let mut remaining = vectors
            .keys()
            .filter(|key| next_token.as_ref().is_none_or(|token| *key > token));
        let keys: Vec<String> = remaining.by_ref().take(self.page_size).cloned().collect();
        let next_token = if remaining.next().is_some() {
            keys.last().cloned()
        } else {
            None
        };
        Ok(ListPage { keys, next_token })
    }

    async fn delete_vectors(
        &self,
        index: &IndexRef,
        keys: Vec<String>,
    ) -> Result<(), VectorStoreError> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Delete { keys: keys.clone() });
        if state.failing.contains(&StoreOperation::Delete) {
            return Err(injected(StoreOperation::Delete));
        }

        if let Some(vectors) = state.indexes.get_mut(index) {
            for key in &keys {
                vectors.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, embedding: Vec<f32>, genre: &str) -> VectorRecord {
        let mut metadata = Map::new();
        metadata.insert("genre".into(), json!(genre));
        VectorRecord {
            key: key.into(),
            embedding,
            metadata,
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_by_key() {
        let store = InMemoryVectorStore::new();
        let index = IndexRef::new("b", "i");
        store
            .put_vectors(&index, vec![record("k", vec![1.0, 0.0], "scifi")])
            .await
            .expect("put");
        store
            .put_vectors(&index, vec![record("k", vec![0.0, 1.0], "drama")])
            .await
            .expect("put");

        assert_eq!(store.keys(&index), vec!["k"]);
        assert_eq!(
            store.metadata(&index, "k").expect("metadata")["genre"],
            json!("drama")
        );
    }

    #[tokio::test]
    async fn query_ranks_by_ascending_distance_and_applies_filter() {
        let store = InMemoryVectorStore::new();
        let index = IndexRef::new("b", "i");
        store
            .put_vectors(
                &index,
                vec![
                    record("far", vec![0.0, 1.0], "scifi"),
                    record("near", vec![1.0, 0.1], "scifi"),
                    record("exact", vec![1.0, 0.0], "drama"),
                ],
            )
            .await
            .expect("put");

        let query = |filter| QueryRequest {
            vector: vec![1.0, 0.0],
            top_k: 2,
            return_distance: true,
            return_metadata: true,
            filter,
        };

        let hits = store.query_vectors(&index, query(None)).await.expect("query");
        let ids: Vec<_> = hits.iter().map(|hit| hit.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near"]);

        let hits = store
            .query_vectors(&index, query(Some(json!({ "genre": "scifi" }))))
            .await
            .expect("query");
        let ids: Vec<_> = hits.iter().map(|hit| hit.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch_within_index() {
        let store = InMemoryVectorStore::new();
        let index = IndexRef::new("b", "i");
        store
            .put_vectors(&index, vec![record("a", vec![1.0, 0.0], "x")])
            .await
            .expect("put");
        let error = store
            .put_vectors(&index, vec![record("b", vec![1.0, 0.0, 0.0], "x")])
            .await
            .unwrap_err();
        assert!(matches!(error, VectorStoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn injected_failures_are_reported_and_recorded() {
        let store = InMemoryVectorStore::new();
        let index = IndexRef::new("b", "i");
        store.fail_operation(StoreOperation::Delete);

        let error = store
            .delete_vectors(&index, vec!["a".into()])
            .await
            .unwrap_err();
        assert!(matches!(error, VectorStoreError::Rejected(_)));
        assert_eq!(
            store.calls(),
            vec![StoreCall::Delete {
                keys: vec!["a".into()]
            }]
        );

        store.clear_failures();
        store
            .delete_vectors(&index, vec!["a".into()])
            .await
            .expect("delete after clearing failures");
    }
}
