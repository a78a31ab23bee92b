//! HTTP client for the managed vector bucket API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::VectorStore;
use super::types::{IndexRef, ListPage, QueryHit, QueryRequest, VectorRecord, VectorStoreError};
use crate::config::Config;
use crate::http::normalize_base_url;

const DEFAULT_LIST_PAGE_SIZE: usize = 500;

/// Lightweight HTTP client for vector bucket operations.
pub struct S3VectorsClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) list_page_size: usize,
}

impl S3VectorsClient {
    /// Construct a new client using the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, VectorStoreError> {
        let client = Client::builder()
            .user_agent(concat!("ragindex/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let base_url = normalize_base_url(&config.vector_store_endpoint)
            .map_err(VectorStoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = config.vector_store_api_key.is_some(),
            "Initialized vector store HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.vector_store_api_key.clone(),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
        })
    }

    async fn call<B, R>(&self, operation: &str, body: &B) -> Result<R, VectorStoreError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format_endpoint(&self.base_url, operation))
            .json(body);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = VectorStoreError::UnexpectedStatus { status, body };
            tracing::error!(operation, error = %error, "Vector store request failed");
            return Err(error);
        }

        // Write operations answer with an empty body.
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return serde_json::from_value(Value::Object(Map::new())).map_err(|err| {
                VectorStoreError::Rejected(format!("{operation}: empty response body: {err}"))
            });
        }
        serde_json::from_slice(&bytes).map_err(|err| {
            VectorStoreError::Rejected(format!("{operation}: malformed response body: {err}"))
        })
    }
}

#[async_trait]
impl VectorStore for S3VectorsClient {
    async fn put_vectors(
        &self,
        index: &IndexRef,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let count = records.len();
        let body = PutVectorsBody {
            vector_bucket_name: &index.bucket,
            index_name: &index.index,
            vectors: records
                .into_iter()
                .map(|record| PutVector {
                    key: record.key,
                    data: VectorData {
                        float32: record.embedding,
                    },
                    metadata: record.metadata,
                })
                .collect(),
        };

        let _: Ignored = self.call("PutVectors", &body).await?;
        tracing::debug!(index = %index, vectors = count, "Vectors upserted");
        Ok(())
    }

    async fn query_vectors(
        &self,
        index: &IndexRef,
        query: QueryRequest,
    ) -> Result<Vec<QueryHit>, VectorStoreError> {
        let body = QueryVectorsBody {
            vector_bucket_name: &index.bucket,
            index_name: &index.index,
            query_vector: VectorData {
                float32: query.vector,
            },
            top_k: query.top_k,
            return_distance: query.return_distance,
            return_metadata: query.return_metadata,
            filter: query.filter,
        };

        let response: QueryVectorsResponse = self.call("QueryVectors", &body).await?;
        tracing::debug!(index = %index, hits = response.vectors.len(), "Vectors queried");
        Ok(response
            .vectors
            .into_iter()
            .map(|hit| QueryHit {
                id: hit.key,
                distance: hit.distance,
                metadata: hit.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn list_vectors(
        &self,
        index: &IndexRef,
        next_token: Option<String>,
    ) -> Result<ListPage, VectorStoreError> {
        let body = ListVectorsBody {
            vector_bucket_name: &index.bucket,
            index_name: &index.index,
            max_results: self.list_page_size,
            next_token,
        };

        let response: ListVectorsResponse = self.call("ListVectors", &body).await?;
        Ok(ListPage {
            keys: response
                .vectors
                .into_iter()
                .map(|entry| entry.key)
                .collect(),
            next_token: response.next_token.filter(|token| !token.is_empty()),
        })
    }

    async fn delete_vectors(
        &self,
        index: &IndexRef,
        keys: Vec<String>,
    ) -> Result<(), VectorStoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let count = keys.len();
        let body = DeleteVectorsBody {
            vector_bucket_name: &index.bucket,
            index_name: &index.index,
            keys,
        };
        let _: Ignored = self.call("DeleteVectors", &body).await?;
        tracing::debug!(index = %index, keys = count, "Vectors deleted");
        Ok(())
    }
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[derive(Serialize)]
struct VectorData {
    float32: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PutVectorsBody<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    vectors: Vec<PutVector>,
}

#[derive(Serialize)]
struct PutVector {
    key: String,
    data: VectorData,
    metadata: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryVectorsBody<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    query_vector: VectorData,
    top_k: usize,
    return_distance: bool,
    return_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListVectorsBody<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteVectorsBody<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct Ignored {}

#[derive(Deserialize)]
struct QueryVectorsResponse {
    #[serde(default)]
    vectors: Vec<QueryVectorsHit>,
}

#[derive(Deserialize)]
struct QueryVectorsHit {
    key: String,
    #[serde(default)]
    distance: Option<Value>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVectorsResponse {
    #[serde(default)]
    vectors: Vec<ListedVector>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
struct ListedVector {
    key: String,
}
