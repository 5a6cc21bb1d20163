//! AWS Transcribe provider

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_transcribe::error::DisplayErrorContext;
use aws_sdk_transcribe::types::{LanguageCode, Media, MediaFormat};
use aws_sdk_transcribe::Client as TranscribeClient;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::error::TranscriptionError;
use crate::provider::{JobStatus, JobStatusReport, StartJobRequest, TranscriptionProvider};

/// Provider backed by AWS Transcribe. Credentials come from the SDK's
/// standard provider chain.
#[derive(Clone)]
pub struct AwsTranscribeProvider {
    client: TranscribeClient,
}

impl Debug for AwsTranscribeProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AwsTranscribeProvider").finish()
    }
}

impl AwsTranscribeProvider {
    /// Create Transcribe client for the given region
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self::from_client(TranscribeClient::new(&config))
    }

    pub fn from_client(client: TranscribeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptionProvider for AwsTranscribeProvider {
    fn name(&self) -> &str {
        "aws_transcribe"
    }

    async fn start_job(&self, request: &StartJobRequest) -> Result<String, TranscriptionError> {
        let media = Media::builder()
            .media_file_uri(request.media_uri.as_str())
            .build();

        self.client
            .start_transcription_job()
            .transcription_job_name(request.job_name.as_str())
            .media(media)
            .media_format(MediaFormat::from(request.media_format.as_str()))
            .language_code(LanguageCode::from(request.language_code.as_str()))
            .output_bucket_name(request.output_bucket.as_str())
            .output_key(request.output_key.as_str())
            .send()
            .await
            .map_err(|e| {
                TranscriptionError::Provider(format!(
                    "Failed to start transcription job: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(request.job_name.clone())
    }

    async fn get_job(&self, job_name: &str) -> Result<JobStatusReport, TranscriptionError> {
        let response = self
            .client
            .get_transcription_job()
            .transcription_job_name(job_name)
            .send()
            .await
            .map_err(|e| {
                TranscriptionError::Provider(format!(
                    "Failed to get transcription job status: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let job = response.transcription_job().ok_or_else(|| {
            TranscriptionError::Provider("Transcription job not found in response".to_string())
        })?;

        let status = job
            .transcription_job_status()
            .map(|s| s.as_str())
            .unwrap_or("UNKNOWN");

        Ok(JobStatusReport {
            status: JobStatus::from_provider(status),
            failure_reason: job.failure_reason().map(|s| s.to_string()),
            transcript_uri: job
                .transcript()
                .and_then(|t| t.transcript_file_uri())
                .map(|s| s.to_string()),
        })
    }
}
