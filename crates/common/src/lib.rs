//! InsureLLM Common Library
//!
//! Shared code for the InsureLLM RAG pipeline services including:
//! - Configuration management
//! - Error types and handling
//! - Object store abstraction (S3 + in-memory fake)
//! - Vector store gateway with idempotent writes
//! - Embedding client abstraction with retry/backoff

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod storage;
pub mod vectors;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::{EmbeddingClient, EmbeddingModel};
pub use errors::{AppError, Result};
pub use storage::ObjectStore;
pub use vectors::VectorStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v2:0";

/// Default vector index name
pub const DEFAULT_VECTOR_INDEX: &str = "rag-insurellm-dev-kb";
