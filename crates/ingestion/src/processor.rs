//! Ingestion processor
//!
//! Core pipeline for a single storage-change record: fetch the document,
//! normalize and chunk it, embed and store whichever chunks have no vector
//! record yet, then write the manifest once.

use crate::chunker::chunk_text;
use crate::errors::IngestionError;
use crate::events::S3EventRecord;
use crate::identity::{chunk_id, doc_id};
use crate::manifest::{manifest_key, preview, ChunkSummary, DocumentSource, Manifest};
use crate::normalize::markdown_to_text;
use chrono::Utc;
use insurellm_common::config::AppConfig;
use insurellm_common::errors::AppError;
use insurellm_common::storage::ObjectStore;
use insurellm_common::vectors::{DocType, VectorMetadata, VectorRecord, VectorStore};
use insurellm_common::EmbeddingClient;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Per-document processing summary, for logging at the call site.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub doc_id: String,
    pub chunk_count: usize,
    pub embedded: usize,
    pub skipped: usize,
}

/// Ingestion pipeline orchestrator.
///
/// Holds only process-wide collaborators; every document is an independent
/// unit of work with no state shared between invocations.
pub struct IngestionProcessor {
    store: Arc<dyn ObjectStore>,
    vectors: VectorStore,
    embedder: EmbeddingClient,
    config: AppConfig,
}

impl IngestionProcessor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        vectors: VectorStore,
        embedder: EmbeddingClient,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            vectors,
            embedder,
            config,
        }
    }

    /// Process one storage-change record end to end.
    ///
    /// Chunks are handled strictly in order. A chunk whose vector record
    /// already exists is recorded in the manifest without an embed call;
    /// that existence check is what makes redelivery of the same document
    /// version safe. Any hard failure aborts the document before the
    /// manifest is written and propagates to the caller.
    #[instrument(skip(self, record), fields(bucket = %record.s3.bucket.name, key = %record.s3.object.key))]
    pub async fn process_event(&self, record: &S3EventRecord) -> Result<DocumentOutcome, IngestionError> {
        let bucket = &record.s3.bucket.name;
        let key = record.s3.object.decoded_key()?;
        let version_id = record.s3.object.version_id.as_deref();
        let etag = record.s3.object.etag.as_deref();

        let doc_id = doc_id(bucket, &key, version_id, etag);
        info!(%doc_id, "Processing document");

        let raw = self
            .store
            .get_text(bucket, &key, version_id)
            .await
            .map_err(|e| AppError::Fetch {
                bucket: bucket.clone(),
                key: key.clone(),
                message: e.to_string(),
            })?;

        let plain = markdown_to_text(&raw);
        let chunks = chunk_text(&plain, &self.config.chunking);

        let doc_type = DocType::from_key(&key);
        let source_uri = format!("s3://{}/{}", bucket, key);
        let created_at = Utc::now();

        let mut manifest = Manifest {
            doc_id: doc_id.clone(),
            source: DocumentSource {
                bucket: bucket.clone(),
                key: key.clone(),
                version_id: version_id.map(|v| v.to_string()),
            },
            created_at,
            chunks: Vec::with_capacity(chunks.len()),
        };

        let mut embedded = 0usize;
        let mut skipped = 0usize;

        for (index, chunk) in chunks.iter().enumerate() {
            let chunk_id = chunk_id(&doc_id, index);

            if self.vectors.exists(&chunk_id).await? {
                debug!(%chunk_id, "Vector already exists, skipping embed");
                skipped += 1;
            } else {
                let embedding = self.embedder.embed(chunk).await?;
                let vector = VectorRecord {
                    id: chunk_id.clone(),
                    index: self.vectors.index().to_string(),
                    namespace: self.vectors.namespace().to_string(),
                    embedding,
                    metadata: VectorMetadata {
                        doc_id: doc_id.clone(),
                        source_s3_uri: source_uri.clone(),
                        chunk_id: chunk_id.clone(),
                        doc_type,
                        created_at,
                        chunk_text_preview: preview(chunk),
                    },
                };
                self.vectors.put(&vector).await?;
                embedded += 1;
            }

            manifest.chunks.push(ChunkSummary {
                chunk_id,
                doc_type,
                chunk_text_preview: preview(chunk),
                source_s3_uri: source_uri.clone(),
                length: chunk.chars().count(),
                created_at,
            });
        }

        self.write_manifest(&manifest).await?;

        info!(
            %doc_id,
            chunk_count = manifest.chunks.len(),
            embedded,
            skipped,
            "Document processed"
        );

        Ok(DocumentOutcome {
            doc_id,
            chunk_count: manifest.chunks.len(),
            embedded,
            skipped,
        })
    }

    async fn write_manifest(&self, manifest: &Manifest) -> Result<(), AppError> {
        let key = manifest_key(&manifest.doc_id);
        let body = serde_json::to_vec(manifest)?;
        self.store
            .put_json(&self.config.storage.processed_bucket, &key, body)
            .await
            .map_err(|e| AppError::Manifest {
                doc_id: manifest.doc_id.clone(),
                message: e.to_string(),
            })
    }
}
