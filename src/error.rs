//! # Error Handling
//!
//! Every failure `fitsize` can report is a [`CompressError`]. Each variant
//! is fatal for the run and maps to its own process exit code.
//!
//! | Variant | Raised by | Exit code |
//! |---------|-----------|-----------|
//! | `InvalidSizeFormat` | size parser | 2 |
//! | `InputNotFound` | dispatcher | 3 |
//! | `UnsupportedFormat` | dispatcher | 4 |
//! | `DurationUnavailable` | video planner (probe) | 5 |
//! | `TargetUnachievable` | image search, video planner | 6 |
//! | `EncodeFailure` | encoder / codec backends | 7 |
//! | `Io`, `Image` | file and decode plumbing | 1 |
//!
//! ## Usage
//!
//! ```rust
//! use fitsize::error::{CompressError, HasRecoverySuggestion};
//!
//! let error = CompressError::target_unachievable("video bitrate would be 512 bps");
//! assert_eq!(error.exit_code(), 6);
//! assert!(error.recovery_suggestion().is_some());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type CompressResult<T> = Result<T, CompressError>;

/// Errors that can occur while compressing a file to a target size.
#[derive(Debug, Error)]
pub enum CompressError {
    /// The size token could not be parsed.
    #[error("Invalid size format '{token}': {reason}")]
    InvalidSizeFormat { token: String, reason: String },

    /// The input path does not exist.
    #[error("Input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    /// The input extension is neither a known image nor a known video type.
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    /// The media probe could not produce a usable duration.
    #[error("Could not determine video duration: {reason}")]
    DurationUnavailable { reason: String },

    /// The target cannot be met by this pipeline.
    #[error("Target size is unachievable: {reason}")]
    TargetUnachievable { reason: String },

    /// An external encoder or codec reported failure.
    #[error("{tool} failed: {reason}")]
    EncodeFailure {
        tool: String,
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error while touching the filesystem.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// The image could not be decoded or encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CompressError {
    /// Create an invalid size format error
    pub fn invalid_size(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSizeFormat {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create an input not found error
    pub fn input_not_found(path: impl Into<PathBuf>) -> Self {
        Self::InputNotFound { path: path.into() }
    }

    /// Create an unsupported format error
    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    /// Create a duration unavailable error
    pub fn duration_unavailable(reason: impl Into<String>) -> Self {
        Self::DurationUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a target unachievable error
    pub fn target_unachievable(reason: impl Into<String>) -> Self {
        Self::TargetUnachievable {
            reason: reason.into(),
        }
    }

    /// Create an encode failure without captured output
    pub fn encode_failure(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EncodeFailure {
            tool: tool.into(),
            reason: reason.into(),
            stderr: None,
        }
    }

    /// Create an encode failure carrying the tool's stderr
    pub fn encode_failure_with_stderr(
        tool: impl Into<String>,
        reason: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        let stderr = stderr.into();
        Self::EncodeFailure {
            tool: tool.into(),
            reason: reason.into(),
            stderr: if stderr.trim().is_empty() {
                None
            } else {
                Some(stderr)
            },
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidSizeFormat { .. } => "size",
            Self::InputNotFound { .. } => "input",
            Self::UnsupportedFormat { .. } => "format",
            Self::DurationUnavailable { .. } => "probe",
            Self::TargetUnachievable { .. } => "target",
            Self::EncodeFailure { .. } => "encode",
            Self::Io { .. } => "io",
            Self::Image(_) => "image",
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidSizeFormat { .. } => 2,
            Self::InputNotFound { .. } => 3,
            Self::UnsupportedFormat { .. } => 4,
            Self::DurationUnavailable { .. } => 5,
            Self::TargetUnachievable { .. } => 6,
            Self::EncodeFailure { .. } => 7,
            Self::Io { .. } | Self::Image(_) => 1,
        }
    }

    /// Captured stderr of a failed external tool, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::EncodeFailure { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for CompressError {
    fn recovery_suggestion(&self) -> Option<&str> {
        match self {
            Self::InvalidSizeFormat { .. } => {
                Some("Use a number with an optional unit, e.g. 5MB, 500KB, 1.5GB or 2048")
            }
            Self::InputNotFound { .. } => Some("Check the input path"),
            Self::UnsupportedFormat { .. } => Some(
                "Supported images: .jpg .jpeg .png .bmp .tiff; videos: .mp4 .mov .avi .mkv .flv",
            ),
            Self::DurationUnavailable { .. } => {
                Some("Make sure ffprobe is installed and the file is a readable video")
            }
            Self::TargetUnachievable { .. } => Some("Choose a larger target size"),
            Self::EncodeFailure { .. } => {
                Some("Re-run with --verbose to see the encoder output")
            }
            Self::Io { .. } | Self::Image(_) => None,
        }
    }
}

/// Error conversion implementations
impl From<std::io::Error> for CompressError {
    fn from(error: std::io::Error) -> Self {
        Self::io("accessing a file", error)
    }
}

impl From<tempfile::PersistError> for CompressError {
    fn from(error: tempfile::PersistError) -> Self {
        Self::io("replacing the output file", error.error)
    }
}
