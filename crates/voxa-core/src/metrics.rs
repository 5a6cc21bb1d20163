//! Stage metrics collected by the ingestion pipeline.
//!
//! The serialized field names are part of the external contract: the merged
//! [`ProcessingMetrics`] object is returned to HTTP callers and written to the
//! audit record, so renaming a field here is a breaking change.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Round `value` to `places` decimal places (half away from zero).
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Convert a byte count to megabytes, rounded to 2 decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_MB, 2)
}

/// Size reduction of `output` relative to `input`, in percent with 2 decimals.
///
/// Negative when the output is larger than the input (common when a
/// compressed source is expanded to PCM). Defined as 0 for an empty input.
pub fn size_reduction_percent(input_bytes: u64, output_bytes: u64) -> f64 {
    if input_bytes == 0 {
        return 0.0;
    }
    round_to((1.0 - output_bytes as f64 / input_bytes as f64) * 100.0, 2)
}

/// Upload throughput in MB/s, rounded to 2 decimals. 0 when `duration` is zero.
pub fn throughput_mbps(size_bytes: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    round_to(size_bytes as f64 / BYTES_PER_MB / secs, 2)
}

/// Metrics produced by the conversion stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionMetrics {
    pub ffmpeg_conversion_time_seconds: f64,
    pub input_file_size_bytes: u64,
    pub input_file_size_mb: f64,
    pub output_file_size_bytes: u64,
    pub output_file_size_mb: f64,
    pub size_reduction_percent: f64,
}

impl ConversionMetrics {
    pub fn from_measurements(elapsed: Duration, input_bytes: u64, output_bytes: u64) -> Self {
        Self {
            ffmpeg_conversion_time_seconds: round_to(elapsed.as_secs_f64(), 3),
            input_file_size_bytes: input_bytes,
            input_file_size_mb: bytes_to_mb(input_bytes),
            output_file_size_bytes: output_bytes,
            output_file_size_mb: bytes_to_mb(output_bytes),
            size_reduction_percent: size_reduction_percent(input_bytes, output_bytes),
        }
    }
}

/// Metrics produced by the upload stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadMetrics {
    pub s3_upload_time_seconds: f64,
    pub s3_upload_speed_mbps: f64,
    /// Bytes sent. Equal to the conversion output size, so not serialized.
    #[serde(skip)]
    pub uploaded_bytes: u64,
}

impl UploadMetrics {
    pub fn from_measurements(elapsed: Duration, size_bytes: u64) -> Self {
        Self {
            s3_upload_time_seconds: round_to(elapsed.as_secs_f64(), 3),
            s3_upload_speed_mbps: throughput_mbps(size_bytes, elapsed),
            uploaded_bytes: size_bytes,
        }
    }
}

/// Merged metrics for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub total_processing_time_seconds: f64,
    #[serde(flatten)]
    pub conversion: ConversionMetrics,
    #[serde(flatten)]
    pub upload: UploadMetrics,
}

impl ProcessingMetrics {
    pub fn merge(total: Duration, conversion: ConversionMetrics, upload: UploadMetrics) -> Self {
        Self {
            total_processing_time_seconds: round_to(total.as_secs_f64(), 3),
            conversion,
            upload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_size_reduction_percent() {
        assert_eq!(size_reduction_percent(1000, 250), 75.0);
        assert_eq!(size_reduction_percent(3, 1), 66.67);
    }

    #[test]
    fn test_size_reduction_percent_negative_when_output_grows() {
        assert_eq!(size_reduction_percent(10_000_000, 10_240_000), -2.4);
    }

    #[test]
    fn test_size_reduction_percent_empty_input() {
        assert_eq!(size_reduction_percent(0, 0), 0.0);
        assert_eq!(size_reduction_percent(0, 4096), 0.0);
    }

    #[test]
    fn test_throughput_zero_duration() {
        assert_eq!(throughput_mbps(10 * 1024 * 1024, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_throughput_is_size_over_duration() {
        assert_eq!(throughput_mbps(10 * 1024 * 1024, Duration::from_secs(4)), 2.5);
        assert_eq!(throughput_mbps(0, Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(10_000_000), 9.54);
    }

    #[test]
    fn test_conversion_metrics_rounding() {
        let metrics =
            ConversionMetrics::from_measurements(Duration::from_micros(1_234_567), 2048, 1024);
        assert_eq!(metrics.ffmpeg_conversion_time_seconds, 1.235);
        assert_eq!(metrics.size_reduction_percent, 50.0);
    }

    #[test]
    fn test_processing_metrics_serializes_exact_keys() {
        let metrics = ProcessingMetrics::merge(
            Duration::from_millis(2500),
            ConversionMetrics::from_measurements(Duration::from_secs(2), 10_000_000, 10_240_000),
            UploadMetrics::from_measurements(Duration::from_millis(500), 10_240_000),
        );

        let value = serde_json::to_value(&metrics).unwrap();
        let keys: BTreeSet<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        let expected: BTreeSet<&str> = [
            "total_processing_time_seconds",
            "ffmpeg_conversion_time_seconds",
            "input_file_size_bytes",
            "input_file_size_mb",
            "output_file_size_bytes",
            "output_file_size_mb",
            "size_reduction_percent",
            "s3_upload_time_seconds",
            "s3_upload_speed_mbps",
        ]
        .into_iter()
        .collect();

        assert_eq!(keys, expected);
        assert_eq!(value["size_reduction_percent"], -2.4);
    }
}
