use anyhow::Result;
use clap::Parser;
use fitsize::config::CompressConfig;
use fitsize::{CompressError, HasRecoverySuggestion};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Shrink an image or video until it fits a size budget:
/// - images: lower JPEG quality, then resolution
/// - videos: bitrate from duration, two-pass ffmpeg encode
#[derive(Parser, Debug)]
#[command(name = "fitsize")]
#[command(version)]
#[command(about = "Compress an image or video to fit a target file size")]
#[command(long_about = "Compress an image or video so the result is no larger than a target size.
Images are re-encoded as JPEG at decreasing quality and, if needed, smaller resolution.
Videos are re-encoded with a two-pass libx264/AAC encode at a bitrate derived from their duration.")]
struct Args {
    /// File to compress
    #[arg(help = "Input image (.jpg .jpeg .png .bmp .tiff) or video (.mp4 .mov .avi .mkv .flv)")]
    input: PathBuf,

    /// Target size
    #[arg(help = "Target size: 5MB, 500KB, 1.5GB or a plain byte count")]
    size: String,

    /// Output path
    #[arg(short, long, help = "Output file (default: <name>_compressed.<ext> next to the input)")]
    output: Option<PathBuf>,

    /// Show encoder output and debug logs
    #[arg(short, long)]
    verbose: bool,

    /// ffmpeg binary
    #[arg(long, env = "FITSIZE_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// ffprobe binary
    #[arg(long, env = "FITSIZE_FFPROBE", default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// Timeout for each ffmpeg/ffprobe run, in seconds
    #[arg(long, env = "FITSIZE_TIMEOUT", default_value_t = 3600)]
    timeout: u64,

    /// Smallest side length the image search may shrink to
    #[arg(long, default_value_t = 16)]
    min_dimension: u32,

    /// Maximum number of image encodes
    #[arg(long, default_value_t = 500)]
    max_iterations: u32,

    /// Extra video encodes when the result is still over target (0 = off)
    #[arg(long, default_value_t = 0)]
    verify_attempts: u32,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "fitsize=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn report(error: &CompressError) {
    eprintln!("Error [{}]: {}", error.category(), error);
    if let Some(stderr) = error.stderr() {
        eprintln!("{}", stderr);
    }
    if let Some(hint) = error.recovery_suggestion() {
        eprintln!("Hint: {}", hint);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = CompressConfig {
        input: args.input,
        size: args.size,
        output: args.output,
        verbose: args.verbose,
        ffmpeg_path: args.ffmpeg,
        ffprobe_path: args.ffprobe,
        timeout_secs: args.timeout,
        min_dimension: args.min_dimension,
        max_iterations: args.max_iterations,
        verify_attempts: args.verify_attempts,
    };

    config.validate().map_err(anyhow::Error::msg)?;
    let options = config.to_compress_options();

    if let Err(error) = fitsize::compress_file(options).await {
        report(&error);
        std::process::exit(error.exit_code());
    }
    Ok(())
}
