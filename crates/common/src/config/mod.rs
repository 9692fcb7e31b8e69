//! Configuration management for InsureLLM pipeline services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Object storage configuration (raw + processed buckets)
    pub storage: StorageConfig,

    /// Vector index configuration
    #[serde(default)]
    pub vectors: VectorIndexConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Text chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Queue configuration (SQS)
    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Bucket holding raw source documents
    pub raw_bucket: String,

    /// Bucket holding processed artifacts (vector records, manifests)
    pub processed_bucket: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorIndexConfig {
    /// Vector index name
    #[serde(default = "default_index")]
    pub index: String,

    /// Vector namespace
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Bedrock model identifier
    #[serde(default = "default_embedding_model")]
    pub model_id: String,

    /// Maximum embed attempts per chunk (initial call + retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff delay cap in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// SQS queue URL delivering storage-change notifications
    pub url: Option<String>,

    /// Long polling timeout in seconds
    #[serde(default = "default_queue_poll_timeout")]
    pub wait_time_seconds: i32,

    /// Maximum messages to receive per poll
    #[serde(default = "default_queue_batch_size")]
    pub max_messages: i32,
}

// Default value functions
fn default_index() -> String {
    crate::DEFAULT_VECTOR_INDEX.to_string()
}
fn default_namespace() -> String {
    "default".to_string()
}
fn default_embedding_model() -> String {
    crate::DEFAULT_EMBEDDING_MODEL.to_string()
}
fn default_max_attempts() -> u32 {
    8
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    8_000
}
fn default_chunk_size() -> usize {
    1200
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_queue_poll_timeout() -> i32 {
    20
}
fn default_queue_batch_size() -> i32 {
    10
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            namespace: default_namespace(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_embedding_model(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: None,
            wait_time_seconds: default_queue_poll_timeout(),
            max_messages: default_queue_batch_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__STORAGE__RAW_BUCKET=insurellm-raw-docs
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Message(format!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.overlap, self.chunking.chunk_size
            )));
        }
        Ok(())
    }

    /// Get the queue long-polling timeout as Duration
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.queue.wait_time_seconds.max(0) as u64)
    }
}
