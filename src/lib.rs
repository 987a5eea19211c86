//! # fitsize
//!
//! Compress an image or a video so the output fits under a byte budget.
//!
//! ## Architecture
//!
//! - `size`: parses target tokens such as `5MB` or `1.5GB`
//! - `dispatch`: classifies the input and routes it to a pipeline
//! - `imaging`: JPEG quality-then-resolution search
//! - `video`: bitrate planning and two-pass encoding through ffmpeg
//! - `config`: configuration defaults and validation
//! - `error`: error taxonomy and exit codes
//!
//! Images are searched greedily: quality first, then resolution. Videos get a
//! closed-form bitrate plan from their duration and a single two-pass encode.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fitsize::config::CompressConfig;
//! use fitsize::{compress_file, CompressOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = CompressConfig::new("holiday.mp4", "8MB").to_compress_options();
//!
//! match compress_file(options).await? {
//!     CompressOutcome::Skipped { .. } => println!("nothing to do"),
//!     CompressOutcome::Compressed { output, .. } => println!("wrote {}", output.display()),
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use tracing::info;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod imaging;
pub mod size;
pub mod video;

/// Re-export error types for convenience
pub use error::{CompressError, CompressResult, HasRecoverySuggestion};

use dispatch::{classify, default_output_path, dispatch_to_pipeline, PipelineSettings};
use imaging::SearchParams;
use size::{format_mb, TargetSpec};
use video::FfmpegTools;

/// Options for a single compression run.
///
/// Usually built from [`config::CompressConfig::to_compress_options`].
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// File to compress.
    pub input: PathBuf,

    /// Target size token, e.g. `"5MB"`.
    pub size: String,

    /// Output path; defaults to `<stem>_compressed<ext>` beside the input.
    pub output: Option<PathBuf>,

    /// Show encoder output.
    pub verbose: bool,

    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,

    /// Upper bound for each external tool invocation, in seconds.
    pub timeout_secs: u64,

    /// Image search policy.
    pub search: SearchParams,

    /// Extra video encodes allowed when the output overshoots. Zero disables
    /// measurement-driven retries.
    pub verify_attempts: u32,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressOutcome {
    /// The input already fit; nothing was written.
    Skipped { current_bytes: u64 },
    /// A new file was written to `output`.
    Compressed {
        output: PathBuf,
        before_bytes: u64,
        after_bytes: u64,
    },
}

/// Main entry point: compress `options.input` to fit `options.size`.
///
/// Steps run in this order: input existence, size parsing, size report,
/// no-op check, classification, pipeline, final report. Progress lines go
/// to stdout.
///
/// # Errors
///
/// Any [`CompressError`]; see [`CompressError::exit_code`] for the mapping
/// to process exit codes.
pub async fn compress_file(options: CompressOptions) -> CompressResult<CompressOutcome> {
    let input = options.input;
    let current_bytes = match tokio::fs::metadata(&input).await {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        Ok(_) => return Err(CompressError::input_not_found(input)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CompressError::input_not_found(input));
        }
        Err(e) => return Err(CompressError::io("reading input metadata", e)),
    };

    let target = TargetSpec::parse(&options.size)?;

    println!("Input: {}", input.display());
    println!("Current Size: {}", format_mb(current_bytes));
    println!("Target Size:  {}", format_mb(target.bytes));

    if current_bytes <= target.bytes {
        println!("File is already smaller than target size. No action needed.");
        info!(current_bytes, target = %target, "input already fits");
        return Ok(CompressOutcome::Skipped { current_bytes });
    }

    let output = options
        .output
        .unwrap_or_else(|| default_output_path(&input));
    let kind = classify(&input)?;

    let settings = PipelineSettings {
        search: options.search,
        tools: FfmpegTools::new(
            options.ffmpeg_path,
            options.ffprobe_path,
            options.timeout_secs,
            options.verbose,
        ),
        verify_attempts: options.verify_attempts,
    };
    let after_bytes = dispatch_to_pipeline(kind, &input, &output, target.bytes, &settings).await?;

    println!("Done! Saved to: {}", output.display());
    println!("Final Size: {}", format_mb(after_bytes));
    info!(
        before = current_bytes,
        after = after_bytes,
        target = target.bytes,
        "compression finished"
    );

    Ok(CompressOutcome::Compressed {
        output,
        before_bytes: current_bytes,
        after_bytes,
    })
}
