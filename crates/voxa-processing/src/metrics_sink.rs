//! Audit records for processed uploads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use voxa_core::{IngestConfig, ProcessingMetrics};

#[derive(Debug, thiserror::Error)]
pub enum MetricsSinkError {
    #[error("Failed to write metrics record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize metrics record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One processed upload, as persisted to the side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub filename: String,
    pub s3_uri: String,
    pub metrics: ProcessingMetrics,
}

#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, record: &AuditRecord) -> Result<(), MetricsSinkError>;
}

/// Writes `{metrics_dir}/{stem of original filename}.json`.
///
/// A later upload with the same original name replaces the earlier record.
#[derive(Debug, Clone)]
pub struct JsonFileMetricsSink {
    dir: PathBuf,
}

impl JsonFileMetricsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, MetricsSinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, original_filename: &str) -> PathBuf {
        let stem = Path::new(original_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unnamed".to_string());
        self.dir.join(format!("{}.json", stem))
    }
}

#[async_trait]
impl MetricsSink for JsonFileMetricsSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), MetricsSinkError> {
        let path = self.path_for(&record.filename);
        let body = serde_json::to_vec_pretty(record)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, body).await?;

        tracing::info!(path = %path.display(), "Metrics saved");
        Ok(())
    }
}

/// Used when metrics persistence is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsSink;

#[async_trait]
impl MetricsSink for NoopMetricsSink {
    async fn record(&self, _record: &AuditRecord) -> Result<(), MetricsSinkError> {
        Ok(())
    }
}

/// Sink selected by `save_metrics` / `metrics_dir`.
pub fn metrics_sink_from_config(
    config: &IngestConfig,
) -> Result<Arc<dyn MetricsSink>, MetricsSinkError> {
    if config.save_metrics {
        Ok(Arc::new(JsonFileMetricsSink::new(config.metrics_dir.clone())?))
    } else {
        Ok(Arc::new(NoopMetricsSink))
    }
}
