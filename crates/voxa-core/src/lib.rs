//! Voxa Core Library
//!
//! This crate provides the configuration, metrics model, error metadata and
//! telemetry setup shared by the ingestion pipeline and the transcription
//! job manager.

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::{IngestConfig, PollSettings};
pub use error::{ErrorMetadata, LogLevel};
pub use metrics::{ConversionMetrics, ProcessingMetrics, UploadMetrics};
pub use storage_types::StorageBackend;
pub use telemetry::{init_telemetry, LogFormat, TelemetryError};
