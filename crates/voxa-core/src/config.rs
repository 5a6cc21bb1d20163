//! Configuration module
//!
//! `IngestConfig` is an explicit value handed to the constructors of the
//! storage factory, the converter, the metrics sink and the transcription job
//! manager. Nothing in the core reads the process environment on its own;
//! `IngestConfig::from_env` is a convenience for the binary that embeds it.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_BUCKET: &str = "my-bucket";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
const DEFAULT_METRICS_DIR: &str = "output/metrics";
const DEFAULT_LANGUAGE_CODE: &str = "en-US";
const POLL_INTERVAL_SECS: u64 = 5;
const MAX_POLL_INTERVAL_SECS: u64 = 30;
const POLL_BACKOFF_MULTIPLIER: f64 = 1.5;
const MAX_WAIT_SECS: u64 = 3600;
const BATCH_CONCURRENCY: usize = 1;

/// Polling behaviour for transcription jobs.
#[derive(Clone, Debug, PartialEq)]
pub struct PollSettings {
    /// Delay before the second status query.
    pub interval: Duration,
    /// Upper bound for the delay after backoff.
    pub max_interval: Duration,
    /// Factor applied to the delay after each non-terminal status.
    pub backoff_multiplier: f64,
    /// Total time after which polling gives up.
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(POLL_INTERVAL_SECS),
            max_interval: Duration::from_secs(MAX_POLL_INTERVAL_SECS),
            backoff_multiplier: POLL_BACKOFF_MULTIPLIER,
            max_wait: Duration::from_secs(MAX_WAIT_SECS),
        }
    }
}

/// Configuration consumed by the ingestion and transcription core.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: String,
    pub aws_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<PathBuf>,
    // Conversion
    pub ffmpeg_path: String,
    /// Directory receiving the temporary `{stem}_converted.wav` artifacts.
    pub work_dir: PathBuf,
    // Audit records
    pub save_metrics: bool,
    pub metrics_dir: PathBuf,
    // Transcription
    pub language_code: String,
    pub poll: PollSettings,
    pub batch_concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            s3_bucket: DEFAULT_BUCKET.to_string(),
            aws_region: DEFAULT_REGION.to_string(),
            s3_endpoint: None,
            local_storage_path: None,
            ffmpeg_path: DEFAULT_FFMPEG_PATH.to_string(),
            work_dir: env::temp_dir(),
            save_metrics: true,
            metrics_dir: PathBuf::from(DEFAULT_METRICS_DIR),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            poll: PollSettings::default(),
            batch_concurrency: BATCH_CONCURRENCY,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = IngestConfig::default();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let poll = PollSettings {
            interval: Duration::from_secs(parse_var(
                "TRANSCRIBE_POLL_INTERVAL_SECS",
                POLL_INTERVAL_SECS,
            )?),
            max_interval: Duration::from_secs(parse_var(
                "TRANSCRIBE_MAX_POLL_INTERVAL_SECS",
                MAX_POLL_INTERVAL_SECS,
            )?),
            backoff_multiplier: parse_var("TRANSCRIBE_POLL_BACKOFF", POLL_BACKOFF_MULTIPLIER)?,
            max_wait: Duration::from_secs(parse_var("TRANSCRIBE_MAX_WAIT_SECS", MAX_WAIT_SECS)?),
        };

        let config = IngestConfig {
            storage_backend,
            s3_bucket: env::var("S3_BUCKET_NAME").unwrap_or(defaults.s3_bucket),
            aws_region: env::var("AWS_REGION").unwrap_or(defaults.aws_region),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok().map(PathBuf::from),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            work_dir: env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            save_metrics: env::var("SAVE_METRICS")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            metrics_dir: env::var("METRICS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.metrics_dir),
            language_code: env::var("TRANSCRIBE_LANGUAGE_CODE").unwrap_or(defaults.language_code),
            poll,
            batch_concurrency: parse_var("TRANSCRIBE_BATCH_CONCURRENCY", BATCH_CONCURRENCY)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_backend == StorageBackend::S3 && self.s3_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "S3_BUCKET_NAME must not be empty when STORAGE_BACKEND=s3"
            ));
        }
        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
            ));
        }
        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }
        if self.poll.interval.is_zero() {
            return Err(anyhow::anyhow!(
                "TRANSCRIBE_POLL_INTERVAL_SECS must be greater than 0"
            ));
        }
        if self.poll.max_interval < self.poll.interval {
            return Err(anyhow::anyhow!(
                "TRANSCRIBE_MAX_POLL_INTERVAL_SECS must be >= TRANSCRIBE_POLL_INTERVAL_SECS"
            ));
        }
        if self.poll.backoff_multiplier < 1.0 {
            return Err(anyhow::anyhow!("TRANSCRIBE_POLL_BACKOFF must be >= 1.0"));
        }
        if self.batch_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "TRANSCRIBE_BATCH_CONCURRENCY must be greater than 0"
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.save_metrics);
        assert_eq!(config.language_code, "en-US");
        assert_eq!(config.poll.interval, Duration::from_secs(5));
    }

    #[test]
    fn test_local_backend_requires_path() {
        let config = IngestConfig {
            storage_backend: StorageBackend::Local,
            ..IngestConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("LOCAL_STORAGE_PATH"), "got: {}", err);
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let config = IngestConfig {
            s3_bucket: "  ".to_string(),
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_settings_validation() {
        let mut config = IngestConfig::default();
        config.poll.max_interval = Duration::from_secs(1);
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.poll.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let config = IngestConfig {
            batch_concurrency: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
