use std::path::{Path, PathBuf};

/// Extensions accepted by the ingestion pipeline.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "mp4", "wav", "m4a", "flac", "avi"];

/// Validation errors for uploaded media files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported file type: '{extension}'. Supported files: {allowed:?}")]
    UnsupportedType {
        extension: String,
        allowed: Vec<String>,
    },
}

/// A file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub original_filename: String,
    /// Lowercase extension without the dot.
    pub extension: String,
}

impl MediaAsset {
    pub fn with_original_filename(mut self, original_filename: impl Into<String>) -> Self {
        self.original_filename = original_filename.into();
        self
    }
}

/// Media file validator
///
/// Checks that the input exists and that its extension is on the allow-list.
/// Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct FileValidator {
    allowed_extensions: Vec<String>,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self {
            allowed_extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl FileValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Validate the file at `path`.
    pub fn validate(&self, path: &Path) -> Result<MediaAsset, ValidationError> {
        if !path.is_file() {
            return Err(ValidationError::NotFound(path.display().to_string()));
        }

        let extension = self.validate_extension(path)?;
        let original_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(MediaAsset {
            path: path.to_path_buf(),
            original_filename,
            extension,
        })
    }

    /// Validate file extension
    pub fn validate_extension(&self, path: &Path) -> Result<String, ValidationError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::UnsupportedType {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(extension)
    }
}
