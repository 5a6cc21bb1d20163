//! Voxa Transcription Library
//!
//! Submits transcription jobs for media already in object storage, polls them
//! to completion with a bounded backoff, and reports per-file outcomes. The
//! transcript for `s3://{bucket}/{dir}/{stem}.{ext}` is always written to
//! `s3://{bucket}/output/{stem}_transcription.json`.

#[cfg(feature = "provider-aws")]
pub mod aws;
pub mod error;
pub mod manager;
pub mod provider;
pub mod uri;

#[cfg(feature = "provider-aws")]
pub use aws::AwsTranscribeProvider;
pub use error::TranscriptionError;
pub use manager::{
    generate_job_name, BatchSummary, PollPolicy, TranscriptionJob, TranscriptionJobManager,
    TranscriptionResult, DEFAULT_LANGUAGE_CODE,
};
pub use provider::{JobStatus, JobStatusReport, StartJobRequest, TranscriptionProvider};
pub use uri::StorageUri;
