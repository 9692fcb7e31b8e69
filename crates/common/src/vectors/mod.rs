//! Vector store gateway
//!
//! Persists one JSON vector record per chunk under a derived object key and
//! answers existence probes against the same key. The probe-then-write pair
//! is what makes re-processing a document version idempotent: a chunk whose
//! record already exists is never re-embedded.
//!
//! The probe and the write are not atomic. Two workers handling a duplicate
//! delivery of the same document version can both observe "absent" and both
//! embed and store the same chunk; the content is identical, so last write
//! wins and only the embedding cost is duplicated. A conditional write
//! could close that window; this pipeline does not use one.

use crate::config::VectorIndexConfig;
use crate::errors::{AppError, StorageError};
use crate::storage::ObjectStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Document category, derived from the first path segment of the source key.
///
/// Descriptive metadata only; the pipeline never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Company,
    Contracts,
    Employees,
    Products,
    Unknown,
}

impl DocType {
    pub fn from_key(key: &str) -> Self {
        match key.split('/').next().unwrap_or("") {
            "company" => DocType::Company,
            "contracts" => DocType::Contracts,
            "employees" => DocType::Employees,
            "products" => DocType::Products,
            _ => DocType::Unknown,
        }
    }
}

/// Metadata stored alongside each embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub doc_id: String,
    pub source_s3_uri: String,
    pub chunk_id: String,
    pub doc_type: DocType,
    pub created_at: DateTime<Utc>,
    pub chunk_text_preview: String,
}

/// The persisted embedding record for one chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub index: String,
    pub namespace: String,
    pub embedding: Vec<f32>,
    pub metadata: VectorMetadata,
}

/// Gateway over the processed bucket for vector records.
pub struct VectorStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    index: String,
    namespace: String,
}

impl VectorStore {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, config: &VectorIndexConfig) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            index: config.index.clone(),
            namespace: config.namespace.clone(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Storage key for a chunk's vector record.
    pub fn object_key(&self, chunk_id: &str) -> String {
        format!("vectors/{}/{}/{}.json", self.index, self.namespace, chunk_id)
    }

    /// Whether a vector record already exists for this chunk.
    ///
    /// "Not found" and "access denied" both answer `false` so permission
    /// hiccups or eventual consistency never halt ingestion; any other
    /// probe failure propagates.
    pub async fn exists(&self, chunk_id: &str) -> Result<bool, AppError> {
        let key = self.object_key(chunk_id);
        match self.store.head(&self.bucket, &key).await {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound) => Ok(false),
            Err(StorageError::AccessDenied) => {
                warn!(key = %key, "Access denied checking vector in processed bucket; treating as missing");
                Ok(false)
            }
            Err(err) => Err(AppError::ExistenceCheck {
                key,
                message: err.to_string(),
            }),
        }
    }

    /// Write a vector record. Hard failure on any store error; not retried.
    pub async fn put(&self, record: &VectorRecord) -> Result<(), AppError> {
        let key = self.object_key(&record.id);
        let body = serde_json::to_vec(record)?;
        self.store
            .put_json(&self.bucket, &key, body)
            .await
            .map_err(|e| AppError::VectorStore {
                chunk_id: record.id.clone(),
                message: e.to_string(),
            })?;

        debug!(chunk_id = %record.id, key = %key, "Vector record stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use async_trait::async_trait;

    fn vector_store(store: Arc<dyn ObjectStore>) -> VectorStore {
        VectorStore::new(store, "processed", &VectorIndexConfig::default())
    }

    fn record(chunk_id: &str) -> VectorRecord {
        VectorRecord {
            id: chunk_id.to_string(),
            index: "rag-insurellm-dev-kb".to_string(),
            namespace: "default".to_string(),
            embedding: vec![0.1, 0.2, 0.3],
            metadata: VectorMetadata {
                doc_id: "abc123".to_string(),
                source_s3_uri: "s3://raw/products/plan.md".to_string(),
                chunk_id: chunk_id.to_string(),
                doc_type: DocType::Products,
                created_at: Utc::now(),
                chunk_text_preview: "preview".to_string(),
            },
        }
    }

    #[test]
    fn test_object_key_derivation() {
        let store = vector_store(Arc::new(MemoryObjectStore::new()));
        assert_eq!(
            store.object_key("abc123:0"),
            "vectors/rag-insurellm-dev-kb/default/abc123:0.json"
        );
    }

    #[test]
    fn test_doc_type_from_key() {
        assert_eq!(DocType::from_key("products/plan.md"), DocType::Products);
        assert_eq!(DocType::from_key("company/about.md"), DocType::Company);
        assert_eq!(DocType::from_key("misc/readme.md"), DocType::Unknown);
        assert_eq!(DocType::from_key(""), DocType::Unknown);
    }

    #[tokio::test]
    async fn test_put_then_exists() {
        let store = vector_store(Arc::new(MemoryObjectStore::new()));

        assert!(!store.exists("abc123:0").await.unwrap());
        store.put(&record("abc123:0")).await.unwrap();
        assert!(store.exists("abc123:0").await.unwrap());
    }

    #[tokio::test]
    async fn test_access_denied_treated_as_absent() {
        let store = vector_store(Arc::new(MemoryObjectStore::with_denied_prefix("vectors/")));
        store.put(&record("abc123:0")).await.unwrap();

        // The record is there, but the probe is denied; ingestion proceeds
        // as if absent rather than failing.
        assert!(!store.exists("abc123:0").await.unwrap());
    }

    struct BrokenStore;

    #[async_trait]
    impl ObjectStore for BrokenStore {
        async fn get_text(
            &self,
            _bucket: &str,
            _key: &str,
            _version_id: Option<&str>,
        ) -> Result<String, StorageError> {
            Err(StorageError::Other("unavailable".to_string()))
        }

        async fn head(&self, _bucket: &str, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Other("unavailable".to_string()))
        }

        async fn put_json(
            &self,
            _bucket: &str,
            _key: &str,
            _body: Vec<u8>,
        ) -> Result<(), StorageError> {
            Err(StorageError::Other("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_other_probe_failures_propagate() {
        let store = vector_store(Arc::new(BrokenStore));
        let err = store.exists("abc123:0").await.unwrap_err();
        assert!(matches!(err, AppError::ExistenceCheck { .. }));
    }

    #[tokio::test]
    async fn test_record_round_trip_is_compact_json() {
        let memory = Arc::new(MemoryObjectStore::new());
        let store = vector_store(memory.clone());
        store.put(&record("abc123:0")).await.unwrap();

        let raw = memory
            .get_raw("processed", "vectors/rag-insurellm-dev-kb/default/abc123:0.json")
            .await
            .unwrap();
        let parsed: VectorRecord = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed.id, "abc123:0");
        assert_eq!(parsed.metadata.doc_type, DocType::Products);
        // Compact encoding: no indentation whitespace.
        assert!(!raw.windows(2).any(|w| w == b"  "));
    }
}
