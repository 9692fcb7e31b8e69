//! Per-document manifest types
//!
//! One manifest is written per document version, summarizing every chunk
//! whether its vector was newly stored or found to already exist. A failed
//! pass writes nothing, so the presence of a manifest implies all listed
//! chunks are persisted.

use chrono::{DateTime, Utc};
use insurellm_common::vectors::DocType;
use serde::{Deserialize, Serialize};

/// First characters of chunk text carried as preview metadata
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSource {
    pub bucket: String,
    pub key: String,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_id: String,
    pub doc_type: DocType,
    pub chunk_text_preview: String,
    pub source_s3_uri: String,
    pub length: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub doc_id: String,
    pub source: DocumentSource,
    pub created_at: DateTime<Utc>,
    pub chunks: Vec<ChunkSummary>,
}

/// Storage key for a document's manifest.
pub fn manifest_key(doc_id: &str) -> String {
    format!("processed/{}/chunks.json", doc_id)
}

/// Preview of chunk text for manifest entries and vector metadata.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
