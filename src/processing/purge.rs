//! Remove every vector from an index.

use futures_util::{TryStreamExt, pin_mut};

use crate::{
    config::Config,
    metrics::PipelineMetrics,
    processing::types::PurgeError,
    vectors::{IndexRef, VectorStore, stream_keys},
};

/// Purge target and delete batching.
#[derive(Debug, Clone)]
pub struct PurgeSettings {
    /// Index to empty.
    pub index: IndexRef,
    /// Keys removed per delete request.
    pub batch_size: usize,
}

impl PurgeSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: IndexRef::new(&config.vector_bucket, &config.vector_index),
            batch_size: config.purge_batch_size,
        }
    }
}

/// Delete every key in the index and return how many were removed.
///
/// The full key listing is collected before the first delete so pagination is never disturbed
/// by concurrent removals. Deletes run sequentially; `on_deleted` is invoked for each key once
/// its batch succeeds. A failing delete stops the purge and leaves remaining keys in place.
pub async fn purge_index(
    store: &dyn VectorStore,
    settings: &PurgeSettings,
    metrics: &PipelineMetrics,
    on_deleted: &mut (dyn FnMut(&str) + Send),
) -> Result<usize, PurgeError> {
    let keys = {
        let stream = stream_keys(store, &settings.index);
        pin_mut!(stream);
        stream
            .try_collect::<Vec<String>>()
            .await
            .map_err(PurgeError::Listing)?
    };

    if keys.is_empty() {
        tracing::info!(index = %settings.index, "Index already empty");
        return Ok(0);
    }
    tracing::info!(index = %settings.index, keys = keys.len(), "Purging index");

    let mut deleted = 0usize;
    for batch in keys.chunks(settings.batch_size.max(1)) {
        store
            .delete_vectors(&settings.index, batch.to_vec())
            .await
            .map_err(|source| PurgeError::Interrupted { deleted, source })?;
        metrics.record_deleted(batch.len() as u64);
        for key in batch {
            tracing::debug!(key = %key, "Deleted vector");
            on_deleted(key);
        }
        deleted += batch.len();
    }

    tracing::info!(index = %settings.index, deleted, "Purge complete");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::{InMemoryVectorStore, StoreCall, StoreOperation, VectorRecord};
    use serde_json::Map;

    async fn seeded(page_size: usize, count: usize) -> InMemoryVectorStore {
        let store = InMemoryVectorStore::with_page_size(page_size);
        let records = (1..=count)
            .map(|n| VectorRecord {
                key: format!("doc.pdf-page-{n}-chunk-1"),
                embedding: vec![1.0, 0.0],
                metadata: Map::new(),
            })
            .collect();
        store
            .put_vectors(&IndexRef::new("bucket", "index"), records)
            .await
            .expect("seed");
        store
    }

    fn settings(batch_size: usize) -> PurgeSettings {
        PurgeSettings {
            index: IndexRef::new("bucket", "index"),
            batch_size,
        }
    }

    #[tokio::test]
    async fn deletes_every_key_one_at_a_time() {
        let store = seeded(2, 5).await;
        let metrics = PipelineMetrics::new();
        let mut removed = Vec::new();

        let deleted = purge_index(&store, &settings(1), &metrics, &mut |key: &str| {
            removed.push(key.to_string())
        })
        .await
        .expect("purge");

        assert_eq!(deleted, 5);
        assert_eq!(removed.len(), 5);
        assert!(store.keys(&settings(1).index).is_empty());
        assert_eq!(metrics.snapshot().vectors_deleted, 5);

        let calls = store.calls();
        let lists = calls
            .iter()
            .filter(|call| matches!(call, StoreCall::List { .. }))
            .count();
        let deletes: Vec<_> = calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::Delete { keys } => Some(keys.len()),
                _ => None,
            })
            .collect();
        assert_eq!(lists, 3);
        assert_eq!(deletes, vec![1; 5]);

        let first_delete = calls
            .iter()
            .position(|call| matches!(call, StoreCall::Delete { .. }))
            .expect("delete issued");
        let last_list = calls
            .iter()
            .rposition(|call| matches!(call, StoreCall::List { .. }))
            .expect("list issued");
        assert!(last_list < first_delete);
    }

    #[tokio::test]
    async fn batches_deletes_when_configured() {
        let store = seeded(10, 5).await;
        let deleted = purge_index(&store, &settings(2), &PipelineMetrics::new(), &mut |_: &str| {})
            .await
            .expect("purge");

        assert_eq!(deleted, 5);
        let sizes: Vec<_> = store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Delete { keys } => Some(keys.len()),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn empty_index_issues_no_deletes() {
        let store = InMemoryVectorStore::new();
        let deleted = purge_index(&store, &settings(1), &PipelineMetrics::new(), &mut |_: &str| {})
            .await
            .expect("purge");

        assert_eq!(deleted, 0);
        assert_eq!(store.calls(), vec![StoreCall::List { next_token: None }]);
    }

    #[tokio::test]
    async fn listing_failure_deletes_nothing() {
        let store = seeded(2, 3).await;
        store.fail_operation(StoreOperation::List);

        let error = purge_index(&store, &settings(1), &PipelineMetrics::new(), &mut |_: &str| {})
            .await
            .unwrap_err();

        assert!(matches!(error, PurgeError::Listing(_)));
        store.clear_failures();
        assert_eq!(store.keys(&settings(1).index).len(), 3);
    }

    #[tokio::test]
    async fn delete_failure_stops_the_purge() {
        let store = seeded(10, 3).await;
        store.fail_operation(StoreOperation::Delete);

        let error = purge_index(&store, &settings(1), &PipelineMetrics::new(), &mut |_: &str| {})
            .await
            .unwrap_err();

        assert!(matches!(error, PurgeError::Interrupted { deleted: 0, .. }));
        let deletes = store
            .calls()
            .iter()
            .filter(|call| matches!(call, StoreCall::Delete { .. }))
            .count();
        assert_eq!(deletes, 1);
    }
}
