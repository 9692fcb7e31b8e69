//! Deterministic identity derivation for documents and chunks

use sha2::{Digest, Sha256};

/// Stable document identifier for one source object version.
///
/// The version token is the object's version id when present, falling back
/// to the etag, then to the empty string. The same inputs always produce
/// the same id; a new content version produces a new id.
pub fn doc_id(bucket: &str, key: &str, version_id: Option<&str>, etag: Option<&str>) -> String {
    let token = version_id.or(etag).unwrap_or("");
    let digest = Sha256::digest(format!("{}:{}:{}", bucket, key, token).as_bytes());
    hex::encode(digest)
}

/// Chunk identifier: document id plus zero-based chunk position.
pub fn chunk_id(doc_id: &str, index: usize) -> String {
    format!("{}:{}", doc_id, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_is_stable() {
        let a = doc_id("b", "k", Some("v1"), None);
        let b = doc_id("b", "k", Some("v1"), None);
        assert_eq!(a, b);
        // 256-bit digest as hex
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_doc_id_changes_with_version() {
        let v1 = doc_id("b", "k", Some("v1"), None);
        let v2 = doc_id("b", "k", Some("v2"), None);
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_doc_id_falls_back_to_etag_then_empty() {
        let with_etag = doc_id("b", "k", None, Some("etag-1"));
        let bare = doc_id("b", "k", None, None);
        assert_ne!(with_etag, bare);

        // version_id wins over etag when both are present
        let versioned = doc_id("b", "k", Some("v1"), Some("etag-1"));
        assert_eq!(versioned, doc_id("b", "k", Some("v1"), None));
    }

    #[test]
    fn test_chunk_id_format() {
        let doc = doc_id("b", "k", Some("v1"), None);
        assert_eq!(chunk_id(&doc, 3), format!("{}:3", doc));
    }
}
