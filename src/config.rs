use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_REGION: &str = "us-west-2";
const DEFAULT_EMBED_MODEL_ID: &str = "amazon.titan-embed-text-v2:0";
const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;
const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_MAX_CHARS_PER_SPLIT: usize = 2000;
const DEFAULT_MAX_METADATA_BYTES: usize = 1800;
const DEFAULT_SOURCE_DOCUMENTS: &str = "./pdf";
const DEFAULT_SEARCH_TOP_K: usize = 3;
const DEFAULT_SEARCH_MAX_TOP_K: usize = 30;
const DEFAULT_PURGE_BATCH_SIZE: usize = 1;
const MAX_PURGE_BATCH_SIZE: usize = 500;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the indexing CLI and the MCP server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Region used to derive default service endpoints.
    pub region: String,
    /// Embedding backend used to vectorize chunks and queries.
    pub embedding_provider: EmbeddingProvider,
    /// Model identifier passed to the embedding service.
    pub embed_model_id: String,
    /// Base URL of the model-invocation API.
    pub embedding_endpoint: String,
    /// Optional bearer token for the model-invocation API.
    pub embedding_api_key: Option<String>,
    /// Expected length of every embedding vector.
    pub embedding_dimension: usize,
    /// Base URL of the vector store API.
    pub vector_store_endpoint: String,
    /// Optional bearer token for the vector store API.
    pub vector_store_api_key: Option<String>,
    /// Vector bucket holding the index.
    pub vector_bucket: String,
    /// Vector index name inside the bucket.
    pub vector_index: String,
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Upper bound applied to any chunk window regardless of `chunk_size`.
    pub max_chars_per_split: usize,
    /// Byte budget for the `source_text` metadata field.
    pub max_metadata_bytes: usize,
    /// Default document file or directory for the indexing command.
    pub source_documents: PathBuf,
    /// Result count used when callers omit `top_k`.
    pub search_default_top_k: usize,
    /// Ceiling applied to caller-supplied `top_k`.
    pub search_max_top_k: usize,
    /// Keys removed per delete call while purging an index.
    pub purge_batch_size: usize,
    /// Per-request timeout for remote services, in seconds.
    pub http_timeout_secs: u64,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hosted model-invocation API (Titan-style request/response bodies).
    Bedrock,
    /// Offline deterministic hashing embedder.
    Hashing,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let region = load_env_optional("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.into());
        let embedding_endpoint = load_env_optional("EMBEDDING_ENDPOINT")
            .unwrap_or_else(|| format!("https://bedrock-runtime.{region}.amazonaws.com"));
        let vector_store_endpoint = load_env_optional("VECTOR_STORE_ENDPOINT")
            .unwrap_or_else(|| format!("https://s3vectors.{region}.api.aws"));

        let purge_batch_size = load_positive("PURGE_BATCH_SIZE", DEFAULT_PURGE_BATCH_SIZE)?;
        if purge_batch_size > MAX_PURGE_BATCH_SIZE {
            return Err(ConfigError::InvalidValue("PURGE_BATCH_SIZE".into()));
        }

        let search_default_top_k = load_positive("SEARCH_DEFAULT_TOP_K", DEFAULT_SEARCH_TOP_K)?;
        let search_max_top_k = load_positive("SEARCH_MAX_TOP_K", DEFAULT_SEARCH_MAX_TOP_K)?;
        if search_default_top_k > search_max_top_k {
            return Err(ConfigError::InvalidValue("SEARCH_DEFAULT_TOP_K".into()));
        }

        let http_timeout_secs =
            load_positive("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS as usize)? as u64;

        Ok(Self {
            embedding_provider: match load_env_optional("EMBEDDING_PROVIDER") {
                Some(value) => value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".into()))?,
                None => EmbeddingProvider::Bedrock,
            },
            embed_model_id: load_env_optional("EMBED_MODEL_ID")
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL_ID.into()),
            embedding_endpoint,
            embedding_api_key: load_env_optional("EMBEDDING_API_KEY"),
            embedding_dimension: load_positive("EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?,
            vector_store_endpoint,
            vector_store_api_key: load_env_optional("VECTOR_STORE_API_KEY"),
            vector_bucket: load_env("VECTOR_BUCKET_NAME")?,
            vector_index: load_env("VECTOR_INDEX_NAME")?,
            chunk_size: load_positive("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            max_chars_per_split: load_positive("MAX_CHARS_PER_SPLIT", DEFAULT_MAX_CHARS_PER_SPLIT)?,
            max_metadata_bytes: load_positive("MAX_METADATA_BYTES", DEFAULT_MAX_METADATA_BYTES)?,
            source_documents: load_env_optional("SOURCE_DOCUMENTS")
                .unwrap_or_else(|| DEFAULT_SOURCE_DOCUMENTS.into())
                .into(),
            search_default_top_k,
            search_max_top_k,
            purge_batch_size,
            http_timeout_secs,
            region,
        })
    }

    /// Chunk window actually applied by the chunker.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.min(self.max_chars_per_split)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_positive(key: &str, default: usize) -> Result<usize, ConfigError> {
    let Some(raw) = load_env_optional(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bedrock" => Ok(Self::Bedrock),
            "hashing" => Ok(Self::Hashing),
            _ => Err(()),
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// Calling this more than once returns the configuration installed by the first call.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    if let Some(existing) = CONFIG.get() {
        return Ok(existing);
    }
    let config = Config::from_env()?;
    tracing::debug!(
        region = %config.region,
        bucket = %config.vector_bucket,
        index = %config.vector_index,
        provider = ?config.embedding_provider,
        model = %config.embed_model_id,
        chunk_size = config.effective_chunk_size(),
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
