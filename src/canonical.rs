//! Canonical Serialization and Hashing
//!
//! The canonical form of a document is its ordered model serialized with
//! the fixed per-type key order (struct declaration order - deliberately
//! chosen, not alphabetical) and 2-space indentation. Two serializations
//! of logically identical documents are byte-identical regardless of input
//! key or array order; the ledger hashes these bytes.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::DocumentKind;

/// Render a value in canonical form.
///
/// Key order comes from struct field declaration; list order must already
/// be established by the deterministic orderer. Opaque metadata objects
/// keep their authored key order.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Content hash of a document's canonical form.
pub fn compute_document_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let canonical = to_canonical_json(value)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Content address for ledger emission:
/// `sha256(kind + ":" + engine_version + ":" + canonical_bytes)`.
/// The kind prefix keeps a tech tree and a blueprint with coincidentally
/// identical serializations from colliding.
pub fn compute_content_address(
    kind: DocumentKind,
    engine_version: &str,
    canonical: &str,
) -> String {
    let combined = format!("{kind}:{engine_version}:{canonical}");
    sha256_hex(combined.as_bytes())
}

// We need hex encoding
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_is_deterministic() {
        let data = b"canonical bytes";
        assert_eq!(sha256_hex(data), sha256_hex(data));
    }

    #[test]
    fn canonical_json_uses_two_space_indent() {
        let value = json!({"id": "t", "version": 2});
        let rendered = to_canonical_json(&value).unwrap();
        assert!(rendered.contains("\n  \"id\""));
    }

    #[test]
    fn metadata_key_order_is_preserved() {
        let text = r#"{"zebra": 1, "aardvark": 2, "mid": 3}"#;
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        let rendered = to_canonical_json(&value).unwrap();
        let z = rendered.find("zebra").unwrap();
        let a = rendered.find("aardvark").unwrap();
        assert!(z < a, "authored key order must survive round-trips");
    }

    #[test]
    fn document_hash_is_the_hash_of_canonical_bytes() {
        let value = json!({"id": "t", "version": 2});
        let canonical = to_canonical_json(&value).unwrap();
        assert_eq!(
            compute_document_hash(&value).unwrap(),
            sha256_hex(canonical.as_bytes())
        );
    }

    #[test]
    fn content_address_separates_kinds() {
        let canonical = "{}";
        let tree = compute_content_address(DocumentKind::TechTree, "1.0.0", canonical);
        let room = compute_content_address(DocumentKind::RoomBlueprint, "1.0.0", canonical);
        assert_ne!(tree, room);
    }
}
