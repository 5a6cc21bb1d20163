//! Shared key generation for storage backends.
//!
//! Key format: `input/{YYYYMMDDTHHMMSS.ffffffZ}-{8 hex}_{filename}`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Prefix under which converted artifacts are uploaded.
pub const INPUT_PREFIX: &str = "input";

/// Generate the storage key for an uploaded artifact.
pub fn generate_input_key(filename: &str) -> String {
    input_key_at(Utc::now(), Uuid::new_v4(), filename)
}

fn input_key_at(now: DateTime<Utc>, nonce: Uuid, filename: &str) -> String {
    let suffix = &nonce.simple().to_string()[..8];
    format!(
        "{}/{}-{}_{}",
        INPUT_PREFIX,
        now.format("%Y%m%dT%H%M%S%.6fZ"),
        suffix,
        filename
    )
}

/// Reject keys that could escape the bucket or storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
