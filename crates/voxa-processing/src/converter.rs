//! Normalization of arbitrary audio/video input to mono 16 kHz 16-bit PCM WAV.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use voxa_core::{ConversionMetrics, IngestConfig};

pub const TARGET_CHANNELS: u32 = 1;
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
pub const TARGET_CODEC: &str = "pcm_s16le";

/// Longest stderr excerpt carried in a [`ConversionError`].
const MAX_DIAGNOSTIC_CHARS: usize = 2000;

#[derive(Debug, thiserror::Error)]
#[error("FFmpeg conversion failed for {input}: {message}")]
pub struct ConversionError {
    pub input: String,
    pub message: String,
}

impl ConversionError {
    fn new(input: &Path, message: impl Into<String>) -> Self {
        Self {
            input: input.display().to_string(),
            message: message.into(),
        }
    }
}

/// Output of a successful conversion. The caller owns `output_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub output_path: PathBuf,
    pub metrics: ConversionMetrics,
}

/// Converter capability used by the pipeline.
///
/// Implementations write to [`MediaConverter::output_path_for`] so the caller
/// knows which file to remove even when `convert` fails halfway. The caller
/// owns `output_dir` and must not share it between concurrent conversions.
#[async_trait]
pub trait MediaConverter: Send + Sync {
    /// Where the converted artifact for `input` is written inside `output_dir`.
    fn output_path_for(&self, input: &Path, output_dir: &Path) -> PathBuf;

    /// Convert `input` into a normalized WAV inside `output_dir`.
    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<ConversionResult, ConversionError>;
}

/// `{stem}_converted.wav` for the given input path.
pub fn converted_filename(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    format!("{}_converted.wav", stem)
}

/// Full ffmpeg argument list for one normalization run.
///
/// Output options are emitted in the order `-ac`, `-acodec`, `-ar`, followed
/// by the output path and the overwrite flag.
pub fn ffmpeg_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-ac".to_string(),
        TARGET_CHANNELS.to_string(),
        "-acodec".to_string(),
        TARGET_CODEC.to_string(),
        "-ar".to_string(),
        TARGET_SAMPLE_RATE.to_string(),
        output.to_string_lossy().to_string(),
        "-y".to_string(),
    ]
}

/// Converter shelling out to the ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    ffmpeg_path: String,
}

impl FfmpegConverter {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.ffmpeg_path.clone())
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.ffmpeg_path
    }
}

#[async_trait]
impl MediaConverter for FfmpegConverter {
    fn output_path_for(&self, input: &Path, output_dir: &Path) -> PathBuf {
        output_dir.join(converted_filename(input))
    }

    #[tracing::instrument(skip(self, input, output_dir), fields(input = %input.display()))]
    async fn convert(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<ConversionResult, ConversionError> {
        let input_size = tokio::fs::metadata(input)
            .await
            .map_err(|e| ConversionError::new(input, format!("Failed to stat input: {}", e)))?
            .len();

        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            ConversionError::new(
                input,
                format!(
                    "Failed to create output dir {}: {}",
                    output_dir.display(),
                    e
                ),
            )
        })?;

        let output_path = self.output_path_for(input, output_dir);
        let args = ffmpeg_args(input, &output_path);

        tracing::info!(
            output = %output_path.display(),
            input_size_bytes = input_size,
            "Converting to 16kHz mono PCM WAV"
        );

        let start = Instant::now();
        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, ffmpeg_path = %self.ffmpeg_path, "Failed to execute ffmpeg");
                ConversionError::new(input, format!("Failed to execute ffmpeg: {}", e))
            })?;
        let elapsed = start.elapsed();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let diagnostic = tail_chars(stderr.trim(), MAX_DIAGNOSTIC_CHARS);
            tracing::error!(status = %output.status, stderr = %diagnostic, "ffmpeg exited with failure");
            return Err(ConversionError::new(
                input,
                if diagnostic.is_empty() {
                    format!("ffmpeg exited with {}", output.status)
                } else {
                    diagnostic
                },
            ));
        }

        let output_size = tokio::fs::metadata(&output_path)
            .await
            .map_err(|e| {
                ConversionError::new(
                    input,
                    format!(
                        "ffmpeg reported success but {} is unreadable: {}",
                        output_path.display(),
                        e
                    ),
                )
            })?
            .len();

        let metrics = ConversionMetrics::from_measurements(elapsed, input_size, output_size);

        tracing::info!(
            output = %output_path.display(),
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            output_size_bytes = output_size,
            size_reduction_percent = metrics.size_reduction_percent,
            "Conversion successful"
        );

        Ok(ConversionResult {
            output_path,
            metrics,
        })
    }
}

/// Last `max` characters of `text`; ffmpeg prints the actual error at the end.
fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_converted_filename() {
        assert_eq!(
            converted_filename(Path::new("/uploads/talk.mp4")),
            "talk_converted.wav"
        );
        assert_eq!(
            converted_filename(Path::new("voice.memo.m4a")),
            "voice.memo_converted.wav"
        );
    }

    #[test]
    fn test_ffmpeg_args_exact() {
        let args = ffmpeg_args(Path::new("/in/talk.mp4"), Path::new("/work/talk_converted.wav"));
        assert_eq!(
            args,
            vec![
                "-i",
                "/in/talk.mp4",
                "-ac",
                "1",
                "-acodec",
                "pcm_s16le",
                "-ar",
                "16000",
                "/work/talk_converted.wav",
                "-y",
            ]
        );
    }

    #[test]
    fn test_ffmpeg_args_same_target_for_every_format() {
        for ext in crate::validator::SUPPORTED_EXTENSIONS {
            let input = PathBuf::from(format!("/in/clip.{}", ext));
            let args = ffmpeg_args(&input, Path::new("/work/clip_converted.wav"));
            let pairs: Vec<(&str, &str)> = args
                .windows(2)
                .map(|w| (w[0].as_str(), w[1].as_str()))
                .collect();

            assert!(pairs.contains(&("-ac", "1")), "{}", ext);
            assert!(pairs.contains(&("-ar", "16000")), "{}", ext);
            assert!(pairs.contains(&("-acodec", "pcm_s16le")), "{}", ext);
        }
    }

    #[test]
    fn test_output_path_in_output_dir() {
        let converter = FfmpegConverter::new("ffmpeg");
        assert_eq!(
            converter.output_path_for(
                Path::new("/uploads/tmpab12.mp3"),
                Path::new("/var/tmp/voxa/run-1")
            ),
            PathBuf::from("/var/tmp/voxa/run-1/tmpab12_converted.wav")
        );
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
    }

    #[tokio::test]
    async fn test_missing_binary_is_conversion_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("talk.mp4");
        std::fs::write(&input, b"not really a video").unwrap();

        let converter = FfmpegConverter::new("/nonexistent/bin/ffmpeg");
        let err = converter.convert(&input, dir.path()).await.unwrap_err();

        assert!(err.message.contains("Failed to execute ffmpeg"), "got: {}", err);
        assert!(err.to_string().contains("talk.mp4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_conversion_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("talk.mp4");
        std::fs::write(&input, b"not really a video").unwrap();

        let converter = FfmpegConverter::new("false");
        let err = converter.convert(&input, dir.path()).await.unwrap_err();

        assert!(err.message.contains("exited with"), "got: {}", err);
    }

    #[tokio::test]
    async fn test_missing_input_is_conversion_error() {
        let dir = tempdir().unwrap();
        let converter = FfmpegConverter::new("ffmpeg");

        let err = converter
            .convert(&dir.path().join("missing.mp3"), dir.path())
            .await
            .unwrap_err();
        assert!(err.message.contains("Failed to stat input"));
    }
}
