//! Embedding service abstraction
//!
//! Provides:
//! - `EmbeddingModel`: one raw inference call, with failures classified as
//!   throttled vs permanent
//! - `BedrockModel`: production implementation over Amazon Bedrock
//! - `EmbeddingClient`: bounded exponential-backoff retry around the model,
//!   plus a small randomized pacing delay on success to smooth outbound
//!   request rate
//! - `MockEmbeddingModel`: deterministic fake for tests

use crate::config::EmbeddingConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Maximum embed attempts per chunk (initial call + retries)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Base backoff delay
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Backoff delay cap
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Uniform jitter multiplier applied to every backoff delay
pub const BACKOFF_JITTER_RANGE: (f64, f64) = (0.75, 1.25);

/// Uniform pacing delay applied after every successful embed call
pub const PACING_DELAY_RANGE: (Duration, Duration) =
    (Duration::from_millis(50), Duration::from_millis(150));

/// Outcome classification for a single raw embedding call.
///
/// The retry loop branches on this instead of inspecting service error
/// codes; only `Throttled` is ever retried.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("throttled: {0}")]
    Throttled(String),

    #[error("{0}")]
    Permanent(String),
}

/// A single raw embedding call against some model. No retries at this level.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed one text, classifying any failure.
    async fn invoke(&self, text: &str) -> Result<Vec<f32>, InvokeError>;

    /// Model identifier, used in error messages and metadata.
    fn model_id(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TitanEmbedRequest<'a> {
    input_text: &'a str,
}

/// Titan-style responses carry the vector under `embedding`; some model
/// revisions use `vector` instead. Both are accepted.
#[derive(Deserialize)]
struct TitanEmbedResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

/// Bedrock embedding model client
pub struct BedrockModel {
    client: BedrockClient,
    model_id: String,
}

impl BedrockModel {
    pub fn new(client: BedrockClient, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl EmbeddingModel for BedrockModel {
    async fn invoke(&self, text: &str) -> Result<Vec<f32>, InvokeError> {
        let payload = serde_json::to_vec(&TitanEmbedRequest { input_text: text })
            .map_err(|e| InvokeError::Permanent(e.to_string()))?;

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(classify_invoke_error)?;

        let body: TitanEmbedResponse = serde_json::from_slice(response.body.as_ref())
            .map_err(|e| InvokeError::Permanent(format!("malformed embedding response: {}", e)))?;

        // A missing or empty vector in an otherwise-successful response is a
        // response-shape problem, not throttling; never retried.
        body.embedding
            .or(body.vector)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| InvokeError::Permanent("embedding response missing vector".to_string()))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn classify_invoke_error(err: SdkError<InvokeModelError>) -> InvokeError {
    if let SdkError::ServiceError(ctx) = &err {
        if ctx.err().is_throttling_exception() {
            return InvokeError::Throttled(err.to_string());
        }
    }
    InvokeError::Permanent(err.to_string())
}

/// Retry/backoff policy for the embedding client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Backoff delay for a zero-based attempt number:
    /// `min(max_delay, base_delay * 2^attempt)` scaled by uniform jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2f64.powi(attempt.min(31) as i32);
        let capped = exponential.min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(BACKOFF_JITTER_RANGE.0..=BACKOFF_JITTER_RANGE.1);
        Duration::from_secs_f64(capped * jitter)
    }

    /// Post-success pacing delay, independent of retry state.
    fn pacing_delay(&self) -> Duration {
        let (low, high) = PACING_DELAY_RANGE;
        let secs = rand::thread_rng().gen_range(low.as_secs_f64()..=high.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Embedding client with bounded retry on throttling.
pub struct EmbeddingClient {
    model: Arc<dyn EmbeddingModel>,
    policy: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(model: Arc<dyn EmbeddingModel>, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    /// Embed one chunk of text.
    ///
    /// Throttling signals are retried with exponential backoff up to the
    /// policy's attempt budget. Any other failure, or an exhausted budget,
    /// is returned as a permanent error naming the model; the caller
    /// decides whether to fail the whole document.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let max_attempts = self.policy.max_attempts;
        for attempt in 0..max_attempts {
            match self.model.invoke(text).await {
                Ok(embedding) => {
                    tokio::time::sleep(self.policy.pacing_delay()).await;
                    return Ok(embedding);
                }
                Err(InvokeError::Throttled(message)) => {
                    if attempt + 1 >= max_attempts {
                        return Err(self.failure(format!(
                            "throttled on all {} attempts: {}",
                            max_attempts, message
                        )));
                    }
                    let delay = self.policy.backoff_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Throttled on embed attempt, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(InvokeError::Permanent(message)) => {
                    return Err(self.failure(message));
                }
            }
        }
        Err(self.failure("retry budget exhausted".to_string()))
    }

    /// Model identifier of the underlying model.
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    fn failure(&self, message: String) -> AppError {
        AppError::Embedding {
            model: self.model.model_id().to_string(),
            message,
        }
    }
}

/// Deterministic mock model for tests.
pub struct MockEmbeddingModel {
    dimension: usize,
}

impl MockEmbeddingModel {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbeddingModel {
    async fn invoke(&self, text: &str) -> Result<Vec<f32>, InvokeError> {
        let seed = text.len() as f32;
        Ok((0..self.dimension)
            .map(|i| (seed + i as f32) * 0.001)
            .collect())
    }

    fn model_id(&self) -> &str {
        "mock-embedding"
    }
}
