//! `s3://bucket/key` parsing and output location derivation.

use std::fmt;
use std::path::Path;

use crate::error::TranscriptionError;

pub const S3_SCHEME: &str = "s3://";
pub const OUTPUT_PREFIX: &str = "output";
const OUTPUT_SUFFIX: &str = "_transcription.json";

/// A parsed object-store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUri {
    pub bucket: String,
    pub key: String,
}

impl StorageUri {
    pub fn parse(uri: &str) -> Result<Self, TranscriptionError> {
        let rest = uri
            .strip_prefix(S3_SCHEME)
            .ok_or_else(|| TranscriptionError::invalid_uri(uri, "expected s3://bucket/key"))?;

        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| TranscriptionError::invalid_uri(uri, "missing object key"))?;

        if bucket.is_empty() {
            return Err(TranscriptionError::invalid_uri(uri, "missing bucket"));
        }
        if key.is_empty() || key.ends_with('/') {
            return Err(TranscriptionError::invalid_uri(uri, "missing object key"));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Last path segment of the key.
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    pub fn stem(&self) -> &str {
        Path::new(self.filename())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_else(|| self.filename())
    }

    /// Lowercase extension of the key, handed to the provider as media format.
    pub fn media_format(&self) -> Result<String, TranscriptionError> {
        Path::new(self.filename())
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                TranscriptionError::invalid_uri(&self.to_string(), "object key has no extension")
            })
    }

    /// `output/{stem}_transcription.json`
    pub fn output_key(&self) -> String {
        format!("{}/{}{}", OUTPUT_PREFIX, self.stem(), OUTPUT_SUFFIX)
    }

    /// Transcript location in the source bucket.
    pub fn output_location(&self) -> StorageUri {
        StorageUri {
            bucket: self.bucket.clone(),
            key: self.output_key(),
        }
    }
}

impl fmt::Display for StorageUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}
