use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use ragindex::{
    embedding::HashingEmbeddingClient,
    metrics::PipelineMetrics,
    processing::{
        ChunkingError, IndexProgress, IndexSettings, Indexer, PageReader, PurgeSettings,
        Retriever, SearchOutcome, SearchRequest, SearchSettings, discover_documents, purge_index,
    },
    vectors::{InMemoryVectorStore, IndexRef, StoreCall},
};
use serde_json::json;

struct StaticPages(HashMap<PathBuf, Vec<String>>);

impl PageReader for StaticPages {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ChunkingError> {
        self.0.get(path).cloned().ok_or_else(|| ChunkingError::Pdf {
            path: path.to_path_buf(),
            message: "unreadable".into(),
        })
    }
}

struct Fixture {
    store: Arc<InMemoryVectorStore>,
    metrics: Arc<PipelineMetrics>,
    indexer: Indexer,
    retriever: Retriever,
    index: IndexRef,
}

fn fixture(pages: HashMap<PathBuf, Vec<String>>) -> Fixture {
    let index = IndexRef::new("docs-bucket", "docs-index");
    let store = Arc::new(InMemoryVectorStore::with_page_size(2));
    let embedder = Arc::new(HashingEmbeddingClient::new(128));
    let metrics = Arc::new(PipelineMetrics::new());

    let indexer = Indexer::new(
        Arc::new(StaticPages(pages)),
        embedder.clone(),
        store.clone(),
        IndexSettings {
            index: index.clone(),
            chunk_size: 40,
            max_metadata_bytes: 32,
        },
        metrics.clone(),
    );
    let retriever = Retriever::new(
        embedder,
        store.clone(),
        SearchSettings {
            index: index.clone(),
            default_top_k: 3,
            max_top_k: 10,
        },
        metrics.clone(),
    );

    Fixture {
        store,
        metrics,
        indexer,
        retriever,
        index,
    }
}

fn ignore_progress() -> impl FnMut(IndexProgress<'_>) + Send {
    |_event: IndexProgress<'_>| {}
}

#[tokio::test]
async fn index_search_and_purge_round_trip() {
    let pages = HashMap::from([
        (
            PathBuf::from("pdf/sleep.pdf"),
            vec![
                "Most toddlers nap once after lunch.".to_string(),
                String::new(),
                "Keep the bedroom dark and quiet.".to_string(),
            ],
        ),
        (
            PathBuf::from("pdf/food.pdf"),
            vec!["Offer vegetables at every meal without pressure to finish them.".to_string()],
        ),
    ]);
    let fx = fixture(pages);

    let report = fx
        .indexer
        .index_documents(
            &[PathBuf::from("pdf/sleep.pdf"), PathBuf::from("pdf/food.pdf")],
            &mut ignore_progress(),
        )
        .await;
    assert_eq!(report.failed(), 0);
    assert_eq!(report.total_vectors(), 4);

    assert_eq!(
        fx.store.keys(&fx.index),
        vec![
            "food.pdf-page-1-chunk-1",
            "food.pdf-page-1-chunk-2",
            "sleep.pdf-page-1-chunk-1",
            "sleep.pdf-page-3-chunk-1",
        ]
    );
    let puts = fx
        .store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StoreCall::Put { .. }))
        .count();
    assert_eq!(puts, 2, "one upsert per document");

    let metadata = fx
        .store
        .metadata(&fx.index, "food.pdf-page-1-chunk-1")
        .expect("metadata");
    assert_eq!(metadata["source_text"], json!("Offer vegetables at every meal w"));
    assert_eq!(metadata["source_file"], json!("food.pdf"));

    let outcome = fx
        .retriever
        .search(SearchRequest::new("Keep the bedroom dark and quiet."))
        .await;
    let SearchOutcome::Hits(hits) = &outcome else {
        panic!("expected hits, got {outcome:?}");
    };
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, "sleep.pdf-page-3-chunk-1");

    let filtered = fx
        .retriever
        .search(SearchRequest {
            query_text: "meal".into(),
            top_k: Some(10),
            filters: vec![("source_file".into(), json!("sleep.pdf"))],
        })
        .await;
    let SearchOutcome::Hits(hits) = filtered else {
        panic!("expected filtered hits");
    };
    assert!(hits.iter().all(|hit| hit.id.starts_with("sleep.pdf-")));

    let mut deleted_keys = Vec::new();
    let deleted = purge_index(
        fx.store.as_ref(),
        &PurgeSettings {
            index: fx.index.clone(),
            batch_size: 1,
        },
        &fx.metrics,
        &mut |key: &str| deleted_keys.push(key.to_string()),
    )
    .await
    .expect("purge");
    assert_eq!(deleted, 4);
    assert_eq!(deleted_keys.len(), 4);

    let after = fx.retriever.search(SearchRequest::new("nap")).await;
    assert_eq!(after.text(), "No similar content found.");

    let snapshot = fx.metrics.snapshot();
    assert_eq!(snapshot.documents_indexed, 2);
    assert_eq!(snapshot.vectors_written, 4);
    assert_eq!(snapshot.vectors_deleted, 4);
    assert_eq!(snapshot.searches_served, 3);
    assert_eq!(snapshot.embedding_calls, 4 + 3);
}

#[tokio::test]
async fn unreadable_document_does_not_stop_the_run() {
    let pages = HashMap::from([(
        PathBuf::from("good.pdf"),
        vec!["Readable page".to_string()],
    )]);
    let fx = fixture(pages);

    let report = fx
        .indexer
        .index_documents(
            &[PathBuf::from("broken.pdf"), PathBuf::from("good.pdf")],
            &mut ignore_progress(),
        )
        .await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(fx.store.keys(&fx.index), vec!["good.pdf-page-1-chunk-1"]);
    assert_eq!(fx.metrics.snapshot().documents_failed, 1);
}

#[test]
fn discovery_feeds_indexer_in_stable_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("b.pdf"), b"").expect("write");
    std::fs::write(dir.path().join("a.pdf"), b"").expect("write");
    std::fs::write(dir.path().join("readme.md"), b"").expect("write");

    let first = discover_documents(&[dir.path().to_path_buf()]).expect("discover");
    let second = discover_documents(&[dir.path().to_path_buf()]).expect("discover");

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(first[0].ends_with("a.pdf"));
}
