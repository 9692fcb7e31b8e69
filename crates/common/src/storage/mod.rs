//! Object store abstraction
//!
//! Provides:
//! - `ObjectStore`: the narrow interface the pipeline needs (fetch text,
//!   existence probe, JSON write)
//! - `S3ObjectStore`: production implementation over the AWS SDK
//! - `MemoryObjectStore`: in-memory fake for tests
//!
//! The S3 client is created once at process start and injected into every
//! consumer; nothing in this module holds per-document state.

use crate::errors::StorageError;
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::Client as S3Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Narrow object-store interface used by the ingestion pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object as UTF-8 text, optionally at a specific version.
    async fn get_text(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Probe for an object's existence. Distinguishes `NotFound` and
    /// `AccessDenied` from other failures; the caller decides tolerance.
    async fn head(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// Write a JSON object (content type `application/json`).
    async fn put_json(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StorageError>;
}

/// Production object store backed by Amazon S3.
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_text(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> Result<String, StorageError> {
        let mut request = self.client.get_object().bucket(bucket).key(key);
        if let Some(version) = version_id {
            request = request.version_id(version);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?
            .into_bytes();

        String::from_utf8(bytes.to_vec())
            .map_err(|e| StorageError::Other(format!("object is not valid UTF-8: {}", e)))
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_head_error(err)),
        }
    }

    async fn put_json(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| StorageError::Other(e.to_string()))?;

        debug!(bucket, key, "Object written");
        Ok(())
    }
}

/// Map a HeadObject SDK error onto the pipeline's storage classification.
///
/// S3 reports a missing key as a modeled NotFound; a key the caller may not
/// read comes back as a bare HTTP 403.
fn classify_head_error(err: SdkError<HeadObjectError>) -> StorageError {
    if let SdkError::ServiceError(ctx) = &err {
        if ctx.err().is_not_found() {
            return StorageError::NotFound;
        }
        match ctx.raw().status().as_u16() {
            404 => return StorageError::NotFound,
            403 => return StorageError::AccessDenied,
            _ => {}
        }
    }
    StorageError::Other(err.to_string())
}

/// In-memory object store for tests.
///
/// Objects live in a map keyed by `bucket/key`. A configurable key prefix
/// can be made to fail existence probes with `AccessDenied`, simulating the
/// permission hiccups the gateway must tolerate.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    denied_prefix: Option<String>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existence probes for keys starting with `prefix` fail with
    /// `AccessDenied`. Reads and writes are unaffected.
    pub fn with_denied_prefix(prefix: impl Into<String>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            denied_prefix: Some(prefix.into()),
        }
    }

    fn object_key(bucket: &str, key: &str) -> String {
        format!("{}/{}", bucket, key)
    }

    /// Seed an object directly (test setup).
    pub async fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .await
            .insert(Self::object_key(bucket, key), body.into());
    }

    /// Raw object bytes, if present (test assertions).
    pub async fn get_raw(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(&Self::object_key(bucket, key))
            .cloned()
    }

    /// All keys currently stored under a bucket, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let prefix = format!("{}/", bucket);
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .await
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(|s| s.to_string()))
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_text(
        &self,
        bucket: &str,
        key: &str,
        _version_id: Option<&str>,
    ) -> Result<String, StorageError> {
        let objects = self.objects.lock().await;
        let body = objects
            .get(&Self::object_key(bucket, key))
            .ok_or(StorageError::NotFound)?;
        String::from_utf8(body.clone())
            .map_err(|e| StorageError::Other(format!("object is not valid UTF-8: {}", e)))
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        if let Some(prefix) = &self.denied_prefix {
            if key.starts_with(prefix.as_str()) {
                return Err(StorageError::AccessDenied);
            }
        }
        let objects = self.objects.lock().await;
        if objects.contains_key(&Self::object_key(bucket, key)) {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }

    async fn put_json(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.objects
            .lock()
            .await
            .insert(Self::object_key(bucket, key), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryObjectStore::new();
        store.insert("bucket", "a.md", "hello").await;

        let text = store.get_text("bucket", "a.md", None).await.unwrap();
        assert_eq!(text, "hello");
        assert!(store.head("bucket", "a.md").await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_missing_object() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            store.head("bucket", "nope").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_memory_store_denied_prefix() {
        let store = MemoryObjectStore::with_denied_prefix("vectors/");
        store.insert("bucket", "vectors/x.json", "{}").await;

        assert!(matches!(
            store.head("bucket", "vectors/x.json").await,
            Err(StorageError::AccessDenied)
        ));
        // Reads still succeed; only the probe is denied.
        assert!(store.get_text("bucket", "vectors/x.json", None).await.is_ok());
    }

    #[tokio::test]
    async fn test_put_json_then_keys() {
        let store = MemoryObjectStore::new();
        store
            .put_json("bucket", "processed/doc/chunks.json", b"{}".to_vec())
            .await
            .unwrap();

        assert_eq!(store.keys("bucket").await, vec!["processed/doc/chunks.json"]);
    }
}
