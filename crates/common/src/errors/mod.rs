//! Error types for the InsureLLM pipeline services
//!
//! Provides:
//! - `AppError`: per-document fatal failures with operation and resource context
//! - `StorageError`: typed classification of object-store probe outcomes so
//!   callers branch on conditions instead of matching message strings

use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// Every variant names the resource it failed on (bucket/key, chunk id, doc
/// id, or model id) so a failed document is attributable from the log line
/// alone.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to fetch {bucket}/{key}: {message}")]
    Fetch {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to embed text with model {model}: {message}")]
    Embedding { model: String, message: String },

    #[error("Failed to store vector {chunk_id}: {message}")]
    VectorStore { chunk_id: String, message: String },

    #[error("Failed to write manifest for {doc_id}: {message}")]
    Manifest { doc_id: String, message: String },

    #[error("Existence check failed for {key}: {message}")]
    ExistenceCheck { key: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Classified object-store failure.
///
/// `NotFound` and `AccessDenied` are distinguished so the vector store
/// gateway can apply its absent-on-denied tolerance policy; everything else
/// collapses into `Other` and propagates as a hard failure.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,

    #[error("access denied")]
    AccessDenied,

    #[error("{0}")]
    Other(String),
}

impl StorageError {
    /// True when the store reported the object as missing (or unreadable in
    /// a way the pipeline tolerates as missing).
    pub fn is_absent(&self) -> bool {
        matches!(self, StorageError::NotFound | StorageError::AccessDenied)
    }
}
