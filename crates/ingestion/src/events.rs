//! Storage-change notification envelope (S3 events delivered via SQS)

use crate::errors::IngestionError;
use serde::Deserialize;

/// The notification body: a batch of S3 change records.
#[derive(Debug, Clone, Deserialize)]
pub struct S3EventEnvelope {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(rename = "versionId")]
    pub version_id: Option<String>,
    #[serde(rename = "eTag")]
    pub etag: Option<String>,
}

impl S3Object {
    /// Object keys arrive URL-encoded, with `+` standing in for spaces.
    pub fn decoded_key(&self) -> Result<String, IngestionError> {
        let plus_decoded = self.key.replace('+', " ");
        urlencoding::decode(&plus_decoded)
            .map(|cow| cow.into_owned())
            .map_err(|e| IngestionError::Event {
                message: format!("invalid object key encoding '{}': {}", self.key, e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let body = r#"{
            "Records": [
                {
                    "s3": {
                        "bucket": {"name": "insurellm-raw"},
                        "object": {
                            "key": "products/rellm+plan.md",
                            "versionId": "v1",
                            "eTag": "abc"
                        }
                    }
                }
            ]
        }"#;

        let envelope: S3EventEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.records.len(), 1);

        let record = &envelope.records[0];
        assert_eq!(record.s3.bucket.name, "insurellm-raw");
        assert_eq!(record.s3.object.decoded_key().unwrap(), "products/rellm plan.md");
        assert_eq!(record.s3.object.version_id.as_deref(), Some("v1"));
        assert_eq!(record.s3.object.etag.as_deref(), Some("abc"));
    }

    #[test]
    fn test_optional_fields_absent() {
        let body = r#"{
            "Records": [
                {"s3": {"bucket": {"name": "b"}, "object": {"key": "company%2Fabout.md"}}}
            ]
        }"#;

        let envelope: S3EventEnvelope = serde_json::from_str(body).unwrap();
        let object = &envelope.records[0].s3.object;
        assert!(object.version_id.is_none());
        assert!(object.etag.is_none());
        assert_eq!(object.decoded_key().unwrap(), "company/about.md");
    }

    #[test]
    fn test_empty_envelope() {
        let envelope: S3EventEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.records.is_empty());
    }
}
