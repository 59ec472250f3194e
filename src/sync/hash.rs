//! Content hashing for sync operations.
//!
//! Hashing the serialized JSON of a snapshot lets export tell whether a
//! merge changed anything without comparing every collection.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute a SHA256 hash of a serializable value.
///
/// The value is first serialized to JSON, then hashed. Field order follows
/// struct declaration order, so equal values always hash equally.
///
/// # Panics
///
/// Panics if the value cannot be serialized to JSON. This should never happen
/// for our data types which are all serializable.
#[must_use]
pub fn content_hash<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).expect("serialization should not fail");
    hash_bytes(json.as_bytes())
}

/// SHA256 of raw bytes as lowercase hex.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Snapshot, WatchPosition};

    #[test]
    fn test_content_hash_deterministic() {
        let snapshot = Snapshot {
            watch_positions: Some(vec![WatchPosition::new("x", 42)]),
            ..Snapshot::default()
        };

        let hash1 = content_hash(&snapshot);
        let hash2 = content_hash(&snapshot.clone());

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA256 produces 64 hex chars
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let a = WatchPosition::new("x", 42);
        let b = WatchPosition::new("x", 43);

        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_hash_bytes_known_value() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
