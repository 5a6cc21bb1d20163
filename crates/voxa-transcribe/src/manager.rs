//! Transcription job lifecycle: submit, poll to a terminal state, report.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use uuid::Uuid;
use voxa_core::{ErrorMetadata, IngestConfig, PollSettings};

use crate::error::TranscriptionError;
use crate::provider::{JobStatus, JobStatusReport, StartJobRequest, TranscriptionProvider};
use crate::uri::StorageUri;

pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
const JOB_NAME_PREFIX: &str = "transcribe";
const MAX_JOB_NAME_LEN: usize = 200;
const JOB_NAME_SUFFIX_HEX: usize = 6;

/// Delay schedule between status queries.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Polling stops with `TimeoutExceeded` once this much time has passed.
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollSettings::default())
    }
}

impl From<&PollSettings> for PollPolicy {
    fn from(settings: &PollSettings) -> Self {
        Self {
            initial_interval: settings.interval,
            max_interval: settings.max_interval,
            multiplier: settings.backoff_multiplier,
            max_wait: settings.max_wait,
        }
    }
}

impl PollPolicy {
    /// Delay after the `attempt`-th non-terminal status (0-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let multiplier = if self.multiplier.is_finite() {
            self.multiplier.max(1.0)
        } else {
            1.0
        };
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let secs = self.initial_interval.as_secs_f64() * multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            self.max_interval
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// A submitted job and where its transcript will land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub job_name: String,
    pub source_uri: String,
    pub media_format: String,
    pub output_bucket: String,
    pub output_key: String,
    pub output_uri: String,
    pub status: JobStatus,
}

/// Per-file outcome. `s3_output_uri` is present iff `success`, `error` iff not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub s3_uri: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_output_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptionResult {
    pub fn succeeded(s3_uri: impl Into<String>, s3_output_uri: impl Into<String>) -> Self {
        Self {
            s3_uri: s3_uri.into(),
            success: true,
            s3_output_uri: Some(s3_output_uri.into()),
            error: None,
        }
    }

    pub fn failed(s3_uri: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            s3_uri: s3_uri.into(),
            success: false,
            s3_output_uri: None,
            error: Some(error.into()),
        }
    }
}

/// Response body for a batch transcription request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<TranscriptionResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<TranscriptionResult>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total_files: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

/// `transcribe-{stem}-{YYYYMMDDHHMMSSmmm}-{6 hex}`, restricted to the
/// characters and length transcription services accept.
pub fn generate_job_name(stem: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    let suffix = format!("{}-{}", timestamp, &nonce[..JOB_NAME_SUFFIX_HEX]);

    let budget = MAX_JOB_NAME_LEN - JOB_NAME_PREFIX.len() - suffix.len() - 2;
    let mut safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(budget)
        .collect();
    if safe.is_empty() {
        safe = "media".to_string();
    }

    format!("{}-{}-{}", JOB_NAME_PREFIX, safe, suffix)
}

/// Drives transcription jobs against a [`TranscriptionProvider`].
///
/// Cheap to clone; clones share the provider.
#[derive(Clone)]
pub struct TranscriptionJobManager {
    provider: Arc<dyn TranscriptionProvider>,
    language_code: String,
    poll: PollPolicy,
    batch_concurrency: usize,
}

impl TranscriptionJobManager {
    pub fn new(provider: Arc<dyn TranscriptionProvider>) -> Self {
        Self {
            provider,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            poll: PollPolicy::default(),
            batch_concurrency: 1,
        }
    }

    pub fn from_config(config: &IngestConfig, provider: Arc<dyn TranscriptionProvider>) -> Self {
        Self::new(provider)
            .with_language_code(config.language_code.clone())
            .with_poll_policy(PollPolicy::from(&config.poll))
            .with_batch_concurrency(config.batch_concurrency)
    }

    /// Manager over AWS Transcribe in the configured region.
    #[cfg(feature = "provider-aws")]
    pub async fn aws_from_config(config: &IngestConfig) -> Self {
        let provider = crate::aws::AwsTranscribeProvider::new(&config.aws_region).await;
        Self::from_config(config, Arc::new(provider))
    }

    pub fn with_language_code(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_batch_concurrency(mut self, batch_concurrency: usize) -> Self {
        self.batch_concurrency = batch_concurrency.max(1);
        self
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Start a job for `uri` and return without waiting.
    pub async fn submit(&self, uri: &str) -> Result<TranscriptionJob, TranscriptionError> {
        let source = StorageUri::parse(uri)?;
        let media_format = source.media_format()?;
        let output = source.output_location();
        let job_name = generate_job_name(source.stem());

        let request = StartJobRequest {
            job_name,
            media_uri: source.to_string(),
            media_format,
            language_code: self.language_code.clone(),
            output_bucket: output.bucket.clone(),
            output_key: output.key.clone(),
        };

        let job_name = self.provider.start_job(&request).await?;

        tracing::info!(
            provider = self.provider.name(),
            job_name = %job_name,
            s3_uri = %request.media_uri,
            output_uri = %output,
            "Transcription job submitted"
        );

        Ok(TranscriptionJob {
            job_name,
            source_uri: request.media_uri,
            media_format: request.media_format,
            output_uri: output.to_string(),
            output_bucket: output.bucket,
            output_key: output.key,
            status: JobStatus::Submitted,
        })
    }

    /// Query the job until it completes, fails, or `max_wait` runs out.
    #[tracing::instrument(skip(self))]
    pub async fn poll_until_terminal(
        &self,
        job_name: &str,
    ) -> Result<JobStatusReport, TranscriptionError> {
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let report = self.provider.get_job(job_name).await?;

            if report.status.is_terminal() {
                if report.status == JobStatus::Failed {
                    return Err(TranscriptionError::JobFailed {
                        job_name: job_name.to_string(),
                        reason: report
                            .failure_reason
                            .unwrap_or_else(|| "Unknown error".to_string()),
                    });
                }

                tracing::info!(
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    attempts = attempt + 1,
                    "Transcription completed successfully"
                );
                return Ok(report);
            }

            let elapsed = start.elapsed();
            if elapsed >= self.poll.max_wait {
                return Err(TranscriptionError::TimeoutExceeded {
                    job_name: job_name.to_string(),
                    waited: elapsed,
                });
            }

            let delay = self
                .poll
                .delay_after(attempt)
                .min(self.poll.max_wait - elapsed);
            tracing::debug!(
                status = report.status.as_str(),
                delay_ms = delay.as_millis() as u64,
                "Transcription still running"
            );
            sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Submit and wait. Every failure becomes an unsuccessful result.
    #[tracing::instrument(skip(self))]
    pub async fn transcribe_one(&self, uri: &str) -> TranscriptionResult {
        let outcome = async {
            let job = self.submit(uri).await?;
            self.poll_until_terminal(&job.job_name).await?;
            Ok::<_, TranscriptionError>(job)
        }
        .await;

        match outcome {
            Ok(job) => TranscriptionResult::succeeded(uri, job.output_uri),
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "Transcription failed");
                TranscriptionResult::failed(uri, e.to_string())
            }
        }
    }

    /// One result per input, in input order, one job at a time.
    pub async fn transcribe_all(&self, uris: &[String]) -> Vec<TranscriptionResult> {
        let mut results = Vec::with_capacity(uris.len());
        for uri in uris {
            results.push(self.transcribe_one(uri).await);
        }
        results
    }

    /// Like [`transcribe_all`](Self::transcribe_all) with up to `limit` jobs
    /// in flight. Results keep input order.
    pub async fn transcribe_all_concurrent(
        &self,
        uris: &[String],
        limit: usize,
    ) -> Vec<TranscriptionResult> {
        if limit <= 1 {
            return self.transcribe_all(uris).await;
        }

        stream::iter(uris)
            .map(|uri| self.transcribe_one(uri))
            .buffered(limit)
            .collect()
            .await
    }

    /// Batch using the configured concurrency.
    pub async fn transcribe_batch(&self, uris: &[String]) -> BatchSummary {
        let results = self
            .transcribe_all_concurrent(uris, self.batch_concurrency)
            .await;
        let summary = BatchSummary::from_results(results);

        tracing::info!(
            total_files = summary.total_files,
            successful = summary.successful,
            failed = summary.failed,
            "Batch transcription finished"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_backs_off_to_cap() {
        let policy = PollPolicy {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            max_wait: Duration::from_secs(600),
        };
        assert_eq!(policy.delay_after(0), Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(4));
        assert_eq!(policy.delay_after(2), Duration::from_secs(8));
        assert_eq!(policy.delay_after(3), Duration::from_secs(10));
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_multiplier_below_one_keeps_interval() {
        let policy = PollPolicy {
            multiplier: 0.5,
            ..PollPolicy::default()
        };
        assert_eq!(policy.delay_after(5), Duration::from_secs(5));
    }

    #[test]
    fn test_job_name_format() {
        let name = generate_job_name("talk");
        let parts: Vec<&str> = name.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "transcribe");
        assert_eq!(parts[1], "talk");
        assert_eq!(parts[2].len(), 17);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[3].len(), 6);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_job_name_sanitized_and_bounded() {
        let name = generate_job_name(&format!("my talk (final)#{}", "x".repeat(400)));
        assert!(name.len() <= MAX_JOB_NAME_LEN);
        assert!(name.starts_with("transcribe-my_talk__final__x"));
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'));

        assert!(generate_job_name("").starts_with("transcribe-media-"));
    }

    #[test]
    fn test_job_names_unique() {
        assert_ne!(generate_job_name("talk"), generate_job_name("talk"));
    }

    #[test]
    fn test_result_serialization_omits_absent_fields() {
        let ok = serde_json::to_value(TranscriptionResult::succeeded(
            "s3://b/a.mp4",
            "s3://b/output/a_transcription.json",
        ))
        .unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["s3_output_uri"], "s3://b/output/a_transcription.json");

        let failed =
            serde_json::to_value(TranscriptionResult::failed("s3://b/bad.mp4", "boom")).unwrap();
        assert!(failed.get("s3_output_uri").is_none());
        assert_eq!(failed["success"], false);
    }

    #[test]
    fn test_batch_summary_counts() {
        let summary = BatchSummary::from_results(vec![
            TranscriptionResult::succeeded("s3://b/a.mp4", "s3://b/output/a_transcription.json"),
            TranscriptionResult::failed("s3://b/bad.mp4", "boom"),
            TranscriptionResult::failed("s3://b/worse.mp4", "boom"),
        ]);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
    }
}
