//! Shared key derivation and validation for storage backends.
//!
//! Key format: `{group_id}/{cell_id}-{timestamp_millis}.{ext}`.

use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Derive the storage key for one proof upload.
///
/// The timestamp must come from a monotonic source so that re-uploads for the
/// same cell always land on a fresh key. All backends must use this format.
pub fn proof_key(group_id: Uuid, cell_id: Uuid, timestamp_millis: i64, extension: &str) -> String {
    format!(
        "{}/{}-{}.{}",
        group_id,
        cell_id,
        timestamp_millis,
        extension.trim_start_matches('.')
    )
}

/// Reject keys that could escape the backend's root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
