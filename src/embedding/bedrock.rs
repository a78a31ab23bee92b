//! HTTP client for the hosted model-invocation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingClient, EmbeddingClientError};
use crate::config::Config;
use crate::http::normalize_base_url;

/// Embedding client that invokes a Titan-style text embedding model over HTTP.
///
/// One request is issued per call: `POST {endpoint}/model/{model_id}/invoke` with
/// `{"inputText": ...}`, answered by `{"embedding": [...]}`.
pub struct BedrockEmbeddingClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) model_id: String,
    pub(crate) api_key: Option<String>,
    pub(crate) dimension: usize,
}

impl BedrockEmbeddingClient {
    /// Construct a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, EmbeddingClientError> {
        let client = Client::builder()
            .user_agent(concat!("ragindex/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        let base_url = normalize_base_url(&config.embedding_endpoint)
            .map_err(EmbeddingClientError::InvalidUrl)?;

        tracing::debug!(
            url = %base_url,
            model = %config.embed_model_id,
            has_api_key = config.embedding_api_key.is_some(),
            "Initialized embedding HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            model_id: config.embed_model_id.clone(),
            api_key: config.embedding_api_key.clone(),
            dimension: config.embedding_dimension,
        })
    }

    fn invoke_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/model/{}/invoke", urlencoding::encode(&self.model_id))
    }
}

#[async_trait]
impl EmbeddingClient for BedrockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        let mut request = self
            .client
            .post(self.invoke_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&InvokeRequest { input_text: text });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingClientError::UnexpectedStatus { status, body };
            tracing::error!(model = %self.model_id, error = %error, "Embedding request failed");
            return Err(error);
        }

        let payload: InvokeResponse = response.json().await?;
        let embedding = payload.embedding;
        if embedding.is_empty() {
            return Err(EmbeddingClientError::EmptyEmbedding);
        }
        if embedding.len() != self.dimension {
            return Err(EmbeddingClientError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        tracing::debug!(
            model = %self.model_id,
            tokens = ?payload.input_text_token_count,
            "Embedding generated"
        );
        Ok(embedding)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    input_text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvokeResponse {
    #[serde(default)]
    embedding: Vec<f32>,
    #[serde(default)]
    input_text_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer, dimension: usize) -> BedrockEmbeddingClient {
        BedrockEmbeddingClient {
            client: Client::builder()
                .user_agent("ragindex-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            model_id: "titan-test".into(),
            api_key: Some("secret".into()),
            dimension,
        }
    }

    #[tokio::test]
    async fn embed_posts_input_text_and_parses_vector() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/model/titan-test/invoke")
                    .header("authorization", "Bearer secret")
                    .json_body(json!({ "inputText": "adventures in space" }));
                then.status(200).json_body(json!({
                    "embedding": [0.25, -0.5, 1.0],
                    "inputTextTokenCount": 3
                }));
            })
            .await;

        let client = client_for(&server, 3);
        let vector = client.embed("adventures in space").await.expect("embedding");

        mock.assert();
        assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn embed_surfaces_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/model/titan-test/invoke");
                then.status(429).body("throttled");
            })
            .await;

        let client = client_for(&server, 3);
        let error = client.embed("hello").await.unwrap_err();
        match error {
            EmbeddingClientError::UnexpectedStatus { status, body } => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "throttled");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn embed_rejects_dimension_mismatch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/model/titan-test/invoke");
                then.status(200).json_body(json!({ "embedding": [0.1, 0.2] }));
            })
            .await;

        let client = client_for(&server, 4);
        let error = client.embed("hello").await.unwrap_err();
        assert!(matches!(
            error,
            EmbeddingClientError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn embed_rejects_missing_embedding_field() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/model/titan-test/invoke");
                then.status(200).json_body(json!({ "inputTextTokenCount": 1 }));
            })
            .await;

        let client = client_for(&server, 4);
        let error = client.embed("hello").await.unwrap_err();
        assert!(matches!(error, EmbeddingClientError::EmptyEmbedding));
    }

    #[test]
    fn model_ids_are_percent_encoded() {
        let server = MockServer::start();
        let mut client = client_for(&server, 3);
        client.model_id = "amazon.titan-embed-text-v2:0".into();

        assert_eq!(
            client.invoke_url(),
            format!(
                "{}/model/amazon.titan-embed-text-v2%3A0/invoke",
                server.base_url()
            )
        );
    }
}
