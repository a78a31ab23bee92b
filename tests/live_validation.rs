//! Checks against real services. Run with `cargo test -- --ignored` after exporting the
//! variables listed in the README.

use futures_util::{StreamExt, pin_mut};
use ragindex::{
    config::{self, Config},
    embedding::build_embedding_client,
    metrics::PipelineMetrics,
    processing::{Retriever, SearchOutcome, SearchRequest, SearchSettings},
    vectors::{build_vector_store, stream_keys},
};

fn live_config() -> &'static Config {
    config::init_config().expect("live configuration")
}

#[tokio::test]
#[ignore = "Requires live embedding endpoint"]
async fn live_embedding_has_configured_dimension() {
    let config = live_config();
    let client = build_embedding_client(config).expect("embedding client");
    let vector = client
        .embed("ragindex live embedding")
        .await
        .expect("failed to request embedding from provider");
    assert_eq!(vector.len(), config.embedding_dimension, "embedding dimension mismatch");
}

#[tokio::test]
#[ignore = "Requires live vector index"]
async fn live_index_lists_first_page() {
    let config = live_config();
    let store = build_vector_store(config).expect("vector store client");
    let settings = SearchSettings::from_config(config);

    let keys = stream_keys(store.as_ref(), &settings.index);
    pin_mut!(keys);
    if let Some(first) = keys.next().await {
        first.expect("listing should succeed");
    }
}

#[tokio::test]
#[ignore = "Requires live embedding endpoint and vector index"]
async fn live_search_round_trip() {
    let config = live_config();
    let retriever = Retriever::new(
        build_embedding_client(config).expect("embedding client"),
        build_vector_store(config).expect("vector store client"),
        SearchSettings::from_config(config),
        std::sync::Arc::new(PipelineMetrics::new()),
    );

    let outcome = retriever.search(SearchRequest::new("sleep")).await;
    assert!(
        matches!(outcome, SearchOutcome::Hits(_) | SearchOutcome::NoResults),
        "search failed: {}",
        outcome.text()
    );
}
