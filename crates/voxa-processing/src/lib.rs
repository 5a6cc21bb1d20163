//! Voxa Media Processing Library
//!
//! This crate turns an uploaded audio/video file into a normalized WAV stored
//! in object storage: validate → convert → upload → audit → cleanup.

pub mod converter;
pub mod error;
pub mod metrics_sink;
pub mod orchestrator;
pub mod validator;

// Re-export commonly used types
pub use converter::{ConversionError, ConversionResult, FfmpegConverter, MediaConverter};
pub use error::PipelineError;
pub use metrics_sink::{
    metrics_sink_from_config, AuditRecord, JsonFileMetricsSink, MetricsSink, MetricsSinkError,
    NoopMetricsSink,
};
pub use orchestrator::{CleanupOutcome, PipelineOrchestrator, PipelineRun, ProcessedMedia};
pub use validator::{FileValidator, MediaAsset, ValidationError, SUPPORTED_EXTENSIONS};
