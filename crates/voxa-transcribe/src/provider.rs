//! Transcription provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranscriptionError;

/// Job lifecycle. `Submitted` is the initial state; `Completed` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Map a provider status string. Queued and unknown states count as
    /// in progress so the caller keeps polling until its deadline.
    pub fn from_provider(status: &str) -> Self {
        match status {
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

/// Parameters of a job submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartJobRequest {
    pub job_name: String,
    pub media_uri: String,
    pub media_format: String,
    pub language_code: String,
    pub output_bucket: String,
    pub output_key: String,
}

/// Snapshot of a job as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub status: JobStatus,
    pub failure_reason: Option<String>,
    pub transcript_uri: Option<String>,
}

impl JobStatusReport {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            failure_reason: None,
            transcript_uri: None,
        }
    }
}

/// Asynchronous speech-to-text service.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Start a job and return its name. Does not wait for completion.
    async fn start_job(&self, request: &StartJobRequest) -> Result<String, TranscriptionError>;

    /// Current status of a job.
    async fn get_job(&self, job_name: &str) -> Result<JobStatusReport, TranscriptionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(JobStatus::from_provider("COMPLETED"), JobStatus::Completed);
        assert_eq!(JobStatus::from_provider("FAILED"), JobStatus::Failed);
        assert_eq!(JobStatus::from_provider("QUEUED"), JobStatus::InProgress);
        assert_eq!(JobStatus::from_provider("IN_PROGRESS"), JobStatus::InProgress);
        assert!(!JobStatus::Submitted.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_serializes_upper_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
    }
}
