//! # Configuration Module
//!
//! This module provides the configuration structure and validation for a
//! compression run. It sits between the CLI and the library: the binary fills
//! a [`CompressConfig`] from its arguments, validates it, and converts it into
//! the [`CompressOptions`](crate::CompressOptions) the pipelines consume.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `input` | `PathBuf` | existing file | File to compress |
//! | `size` | `String` | size token | Target budget, e.g. `5MB` |
//! | `output` | `Option<PathBuf>` | any path | Defaults to `<stem>_compressed<ext>` |
//! | `verbose` | `bool` | | Show encoder output |
//! | `ffmpeg_path` | `PathBuf` | | Video encoder binary |
//! | `ffprobe_path` | `PathBuf` | | Media probe binary |
//! | `timeout_secs` | `u64` | 1.. | Bound for each external invocation |
//! | `min_dimension` | `u32` | 1.. | Smallest image side the search will try |
//! | `max_iterations` | `u32` | 1.. | Encode budget for the image search |
//! | `verify_attempts` | `u32` | 0-10 | Extra video encodes when the output overshoots |
//!
//! ## Examples
//!
//! ```rust
//! use fitsize::config::config::CompressConfig;
//!
//! let config = CompressConfig::new("holiday.jpg", "2MB");
//! assert!(config.validate().is_ok());
//!
//! let options = config.to_compress_options();
//! assert_eq!(options.size, "2MB");
//! ```

use std::path::PathBuf;

use crate::imaging::SearchParams;

/// Configuration structure for a compression run.
#[derive(Debug, Clone)]
pub struct CompressConfig {
    /// File to compress.
    pub input: PathBuf,

    /// Target size token as typed by the user (parsed later by the size parser).
    pub size: String,

    /// Output path. When `None`, `<stem>_compressed<ext>` next to the input.
    pub output: Option<PathBuf>,

    /// Let the encoder write its own progress to the terminal.
    pub verbose: bool,

    /// Path or name of the ffmpeg binary.
    pub ffmpeg_path: PathBuf,

    /// Path or name of the ffprobe binary.
    pub ffprobe_path: PathBuf,

    /// Upper bound, in seconds, for any single ffmpeg/ffprobe invocation.
    pub timeout_secs: u64,

    /// The image search gives up rather than shrink a side below this.
    pub min_dimension: u32,

    /// The image search gives up after this many encodes.
    pub max_iterations: u32,

    /// Additional encodes the video pipeline may run when the output is
    /// still over target. Zero keeps the planner open-loop.
    pub verify_attempts: u32,
}

impl Default for CompressConfig {
    /// Default values:
    /// - `ffmpeg_path` / `ffprobe_path`: looked up on `PATH`
    /// - `timeout_secs`: 3600
    /// - `min_dimension`: 16
    /// - `max_iterations`: 500
    /// - `verify_attempts`: 0
    fn default() -> Self {
        let search = SearchParams::default();
        Self {
            input: PathBuf::new(),
            size: String::new(),
            output: None,
            verbose: false,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            timeout_secs: 3600,
            min_dimension: search.min_dimension,
            max_iterations: search.max_iterations,
            verify_attempts: 0,
        }
    }
}

impl CompressConfig {
    /// Creates a configuration for `input` and `size` with defaults for everything else.
    pub fn new(input: impl Into<PathBuf>, size: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            size: size.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration parameters.
    ///
    /// The size token itself is checked by the size parser so that a bad
    /// token surfaces as `InvalidSizeFormat` with its own exit code.
    pub fn validate(&self) -> Result<(), String> {
        if self.input.as_os_str().is_empty() {
            return Err("Input path must not be empty".to_string());
        }
        if self.size.trim().is_empty() {
            return Err("Target size must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0 seconds".to_string());
        }
        if self.min_dimension == 0 {
            return Err("Minimum dimension must be at least 1 pixel".to_string());
        }
        if self.max_iterations == 0 {
            return Err("Maximum iterations must be greater than 0".to_string());
        }
        if self.verify_attempts > 10 {
            return Err("Verify attempts must be between 0 and 10".to_string());
        }
        Ok(())
    }

    /// Convert to CompressOptions for use with the library
    pub fn to_compress_options(&self) -> crate::CompressOptions {
        crate::CompressOptions {
            input: self.input.clone(),
            size: self.size.clone(),
            output: self.output.clone(),
            verbose: self.verbose,
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffprobe_path: self.ffprobe_path.clone(),
            timeout_secs: self.timeout_secs,
            search: SearchParams {
                min_dimension: self.min_dimension,
                max_iterations: self.max_iterations,
                ..SearchParams::default()
            },
            verify_attempts: self.verify_attempts,
        }
    }
}
