//! Upload of local artifacts into the configured storage backend.

use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use voxa_core::metrics::bytes_to_mb;
use voxa_core::UploadMetrics;

use crate::keys::generate_input_key;
use crate::traits::{Storage, StorageError, StorageResult};

/// Where an artifact was stored, plus how long it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageLocation {
    pub uri: String,
    pub bucket: String,
    pub key: String,
    pub metrics: UploadMetrics,
}

/// Uploads local files under the `input/` namespace and measures throughput.
#[derive(Clone)]
pub struct MediaUploader {
    storage: Arc<dyn Storage>,
}

impl MediaUploader {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Upload the file at `path` and return its location and upload metrics.
    pub async fn upload(&self, path: &Path) -> StorageResult<StorageLocation> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StorageError::InvalidKey(format!("No usable file name in {}", path.display()))
            })?;
        let key = generate_input_key(filename);

        let data = tokio::fs::read(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let size = data.len() as u64;

        tracing::info!(
            path = %path.display(),
            bucket = %self.storage.bucket(),
            key = %key,
            size_bytes = size,
            "Uploading artifact"
        );

        let start = Instant::now();
        self.storage.put(&key, Bytes::from(data)).await.map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path.display(),
                key = %key,
                "Artifact upload failed"
            );
            e
        })?;
        let elapsed = start.elapsed();

        let metrics = UploadMetrics::from_measurements(elapsed, size);
        let uri = self.storage.uri_for(&key);

        tracing::info!(
            uri = %uri,
            size_mb = bytes_to_mb(size),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            speed_mbps = metrics.s3_upload_speed_mbps,
            "Upload successful"
        );

        Ok(StorageLocation {
            uri,
            bucket: self.storage.bucket().to_string(),
            key,
            metrics,
        })
    }
}
