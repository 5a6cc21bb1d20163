//! Pipeline orchestration: validate → convert → upload → audit → cleanup.
//!
//! One call to [`PipelineOrchestrator::run`] processes exactly one file.
//! Each run converts into its own scratch directory under the work dir, so
//! concurrent runs never share an artifact. The artifact and its directory
//! are removed on every exit path once conversion has been attempted;
//! removal problems are reported in [`CleanupOutcome`] and never replace the
//! pipeline result.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use voxa_core::{ErrorMetadata, IngestConfig, LogLevel, ProcessingMetrics};
use voxa_storage::{MediaUploader, Storage, StorageError};

use crate::converter::{ConversionError, FfmpegConverter, MediaConverter};
use crate::error::PipelineError;
use crate::metrics_sink::{metrics_sink_from_config, AuditRecord, MetricsSink, MetricsSinkError};
use crate::validator::FileValidator;

/// What happened to the temporary conversion artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The run stopped before conversion, so there was nothing to remove.
    NotCreated,
    Removed,
    /// Conversion never wrote the file, or something else removed it.
    AlreadyGone,
    /// Removal failed; the run result is unaffected.
    Failed(String),
}

/// Response body for a processed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedMedia {
    pub s3_uri: String,
    pub original_filename: String,
    pub metrics: ProcessingMetrics,
}

const SCRATCH_PREFIX: &str = "voxa-";

/// Scratch directory of one run and the artifact planned inside it.
struct Scratch {
    dir: TempDir,
    artifact: PathBuf,
}

/// Result of one run together with the artifact cleanup outcome.
#[derive(Debug)]
pub struct PipelineRun {
    pub result: Result<ProcessedMedia, PipelineError>,
    pub cleanup: CleanupOutcome,
}

pub struct PipelineOrchestrator {
    validator: FileValidator,
    converter: Arc<dyn MediaConverter>,
    uploader: MediaUploader,
    metrics_sink: Arc<dyn MetricsSink>,
    work_dir: PathBuf,
}

impl PipelineOrchestrator {
    pub fn new(
        validator: FileValidator,
        converter: Arc<dyn MediaConverter>,
        uploader: MediaUploader,
        metrics_sink: Arc<dyn MetricsSink>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            validator,
            converter,
            uploader,
            metrics_sink,
            work_dir: work_dir.into(),
        }
    }

    /// Production wiring: ffmpeg converter and the configured metrics sink.
    pub fn from_config(
        config: &IngestConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, MetricsSinkError> {
        Ok(Self::new(
            FileValidator::new(),
            Arc::new(FfmpegConverter::from_config(config)),
            MediaUploader::new(storage),
            metrics_sink_from_config(config)?,
            config.work_dir.clone(),
        ))
    }

    pub async fn process(
        &self,
        input: &Path,
        original_filename: &str,
    ) -> Result<ProcessedMedia, PipelineError> {
        self.run(input, original_filename).await.result
    }

    #[tracing::instrument(skip(self, input), fields(input = %input.display()))]
    pub async fn run(&self, input: &Path, original_filename: &str) -> PipelineRun {
        let start = Instant::now();
        let mut scratch: Option<Scratch> = None;

        let result = self
            .execute(input, original_filename, start, &mut scratch)
            .await;

        let cleanup = match scratch {
            Some(scratch) => remove_scratch(scratch).await,
            None => CleanupOutcome::NotCreated,
        };

        match &result {
            Ok(processed) => tracing::info!(
                s3_uri = %processed.s3_uri,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Pipeline completed"
            ),
            Err(e) => match e.log_level() {
                LogLevel::Debug => tracing::debug!(error = %e, code = e.error_code(), "Pipeline rejected input"),
                LogLevel::Warn => tracing::warn!(error = %e, code = e.error_code(), "Pipeline failed"),
                LogLevel::Error => tracing::error!(error = %e, code = e.error_code(), "Pipeline failed"),
            },
        }

        PipelineRun { result, cleanup }
    }

    async fn execute(
        &self,
        input: &Path,
        original_filename: &str,
        start: Instant,
        scratch: &mut Option<Scratch>,
    ) -> Result<ProcessedMedia, PipelineError> {
        let mut asset = self.validator.validate(input)?;
        if !original_filename.is_empty() {
            asset = asset.with_original_filename(original_filename);
        }

        let dir = self.create_scratch_dir().map_err(|e| ConversionError {
            input: asset.path.display().to_string(),
            message: format!(
                "Failed to create scratch dir in {}: {}",
                self.work_dir.display(),
                e
            ),
        })?;

        // Recorded before converting so a partial output is still removed.
        let planned = self.converter.output_path_for(&asset.path, dir.path());
        let output_dir = dir.path().to_path_buf();
        let scratch = scratch.insert(Scratch {
            dir,
            artifact: planned,
        });

        let conversion = self.converter.convert(&asset.path, &output_dir).await?;
        scratch.artifact = conversion.output_path.clone();

        let location = self.uploader.upload(&conversion.output_path).await?;
        if location.uri.trim().is_empty() {
            return Err(StorageError::UploadFailed(format!(
                "Storage returned an empty URI for key {}",
                location.key
            ))
            .into());
        }

        let metrics =
            ProcessingMetrics::merge(start.elapsed(), conversion.metrics, location.metrics);

        let record = AuditRecord {
            filename: asset.original_filename.clone(),
            s3_uri: location.uri.clone(),
            metrics: metrics.clone(),
        };
        if let Err(e) = self.metrics_sink.record(&record).await {
            tracing::warn!(
                error = %e,
                filename = %asset.original_filename,
                "Failed to save metrics record"
            );
        }

        Ok(ProcessedMedia {
            s3_uri: location.uri,
            original_filename: asset.original_filename,
            metrics,
        })
    }

    fn create_scratch_dir(&self) -> std::io::Result<TempDir> {
        std::fs::create_dir_all(&self.work_dir)?;
        tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.work_dir)
    }
}

/// Remove the artifact, then the scratch directory with anything left in it.
async fn remove_scratch(scratch: Scratch) -> CleanupOutcome {
    let outcome = remove_artifact(&scratch.artifact).await;
    let dir_path = scratch.dir.path().to_path_buf();

    match scratch.dir.close() {
        Ok(()) => outcome,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %dir_path.display(),
                "Failed to remove scratch directory"
            );
            match outcome {
                CleanupOutcome::Failed(_) => outcome,
                _ => CleanupOutcome::Failed(e.to_string()),
            }
        }
    }
}

async fn remove_artifact(path: &Path) -> CleanupOutcome {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed temporary artifact");
            CleanupOutcome::Removed
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CleanupOutcome::AlreadyGone,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove temporary artifact"
            );
            CleanupOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_remove_artifact_outcomes() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("talk_converted.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        assert_eq!(remove_artifact(&file).await, CleanupOutcome::Removed);
        assert!(!file.exists());
        assert_eq!(remove_artifact(&file).await, CleanupOutcome::AlreadyGone);

        let as_dir = dir.path().join("dir_converted.wav");
        std::fs::create_dir(&as_dir).unwrap();
        assert!(matches!(
            remove_artifact(&as_dir).await,
            CleanupOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_remove_scratch_clears_directory() {
        let work_dir = tempdir().unwrap();
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(work_dir.path())
            .unwrap();
        let artifact = dir.path().join("talk_converted.wav");
        std::fs::write(&artifact, b"RIFF").unwrap();
        std::fs::write(dir.path().join("ffmpeg.log"), b"x").unwrap();

        let outcome = remove_scratch(Scratch { dir, artifact }).await;

        assert_eq!(outcome, CleanupOutcome::Removed);
        assert_eq!(std::fs::read_dir(work_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_scratch_dirs_are_distinct_per_run() {
        let work_dir = tempdir().unwrap();
        let orchestrator = PipelineOrchestrator::new(
            FileValidator::new(),
            Arc::new(FfmpegConverter::new("ffmpeg")),
            MediaUploader::new(Arc::new(NullStorage)),
            Arc::new(crate::metrics_sink::NoopMetricsSink),
            work_dir.path().join("nested"),
        );

        let first = orchestrator.create_scratch_dir().unwrap();
        let second = orchestrator.create_scratch_dir().unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(work_dir.path().join("nested")));
        let input = Path::new("/uploads/talk.mp4");
        assert_ne!(
            orchestrator.converter.output_path_for(input, first.path()),
            orchestrator.converter.output_path_for(input, second.path())
        );
    }

    struct NullStorage;

    #[async_trait::async_trait]
    impl Storage for NullStorage {
        async fn put(&self, _storage_key: &str, _data: bytes::Bytes) -> voxa_storage::StorageResult<()> {
            Ok(())
        }

        async fn exists(&self, _storage_key: &str) -> voxa_storage::StorageResult<bool> {
            Ok(false)
        }

        fn bucket(&self) -> &str {
            "null"
        }

        fn backend_type(&self) -> voxa_storage::StorageBackend {
            voxa_storage::StorageBackend::S3
        }
    }
}
