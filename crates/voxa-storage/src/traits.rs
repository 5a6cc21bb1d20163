//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// An object is addressed by `(bucket, key)` and exposed to downstream
/// consumers as `{scheme}://{bucket}/{key}`. A successful `put` means the
/// object is immediately readable.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key`, replacing any existing object.
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Bucket (or root) the backend writes into.
    fn bucket(&self) -> &str;

    /// URI handed to downstream consumers such as the transcription provider.
    fn uri_for(&self, storage_key: &str) -> String {
        format!(
            "{}://{}/{}",
            self.backend_type().scheme(),
            self.bucket(),
            storage_key
        )
    }

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
