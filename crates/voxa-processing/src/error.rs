use voxa_core::{ErrorMetadata, LogLevel};
use voxa_storage::StorageError;

use crate::converter::ConversionError;
use crate::validator::ValidationError;

/// Failure of one pipeline run, tagged with the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Failed to upload to storage: {0}")]
    Upload(#[from] StorageError),
}

/// (status, code, recoverable, log level)
fn pipeline_error_static_metadata(err: &PipelineError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        PipelineError::Validation(ValidationError::NotFound(_)) => {
            (400, "FILE_NOT_FOUND", false, LogLevel::Debug)
        }
        PipelineError::Validation(ValidationError::UnsupportedType { .. }) => {
            (400, "UNSUPPORTED_FILE_TYPE", false, LogLevel::Debug)
        }
        PipelineError::Conversion(_) => (400, "CONVERSION_FAILED", false, LogLevel::Warn),
        PipelineError::Upload(StorageError::ConfigError(_)) => {
            (500, "STORAGE_CONFIG_ERROR", false, LogLevel::Error)
        }
        PipelineError::Upload(_) => (502, "UPLOAD_FAILED", true, LogLevel::Error),
    }
}

impl ErrorMetadata for PipelineError {
    fn http_status_code(&self) -> u16 {
        pipeline_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        pipeline_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        pipeline_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        pipeline_error_static_metadata(self).3
    }
}
