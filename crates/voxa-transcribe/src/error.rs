use std::time::Duration;
use voxa_core::{ErrorMetadata, LogLevel};

/// Transcription errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Invalid storage URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Transcription provider error: {0}")]
    Provider(String),

    #[error("Transcription job failed: {reason}")]
    JobFailed { job_name: String, reason: String },

    #[error("Transcription job {job_name} did not finish within {waited:?}")]
    TimeoutExceeded { job_name: String, waited: Duration },
}

impl TranscriptionError {
    pub(crate) fn invalid_uri(uri: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }
}

/// (status, code, recoverable, log level)
fn transcription_error_static_metadata(
    err: &TranscriptionError,
) -> (u16, &'static str, bool, LogLevel) {
    match err {
        TranscriptionError::InvalidUri { .. } => (400, "INVALID_STORAGE_URI", false, LogLevel::Debug),
        TranscriptionError::Provider(_) => (502, "TRANSCRIPTION_PROVIDER_ERROR", true, LogLevel::Error),
        TranscriptionError::JobFailed { .. } => (400, "TRANSCRIPTION_JOB_FAILED", false, LogLevel::Warn),
        TranscriptionError::TimeoutExceeded { .. } => (504, "TRANSCRIPTION_TIMEOUT", true, LogLevel::Warn),
    }
}

impl ErrorMetadata for TranscriptionError {
    fn http_status_code(&self) -> u16 {
        transcription_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        transcription_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        transcription_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        transcription_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_failed_message_carries_reason() {
        let err = TranscriptionError::JobFailed {
            job_name: "transcribe-talk".to_string(),
            reason: "Unsupported media format".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Transcription job failed: Unsupported media format"
        );
        assert_eq!(err.http_status_code(), 400);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        let err = TranscriptionError::TimeoutExceeded {
            job_name: "transcribe-talk".to_string(),
            waited: Duration::from_secs(60),
        };
        assert_eq!(err.http_status_code(), 504);
        assert_eq!(err.error_code(), "TRANSCRIPTION_TIMEOUT");
        assert!(err.is_recoverable());
    }
}
