//! Input classification, output naming, and routing to a pipeline.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{CompressError, CompressResult};
use crate::imaging::{compress_image, SearchParams};
use crate::size::format_kb;
use crate::video::{compress_video, FfmpegTools};

/// Extensions routed to the image pipeline.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

/// Extensions routed to the video pipeline.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "flv"];

/// Output extensions whose format is lossless.
pub const LOSSLESS_EXTENSIONS: &[&str] = &["png", "bmp", "tiff"];

/// Which pipeline handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_ascii_lowercase())
}

/// Classify `path` by extension, ignoring case.
pub fn classify(path: &Path) -> CompressResult<MediaKind> {
    let ext = extension_lowercase(path).unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Ok(MediaKind::Video)
    } else {
        Err(CompressError::unsupported_format(ext))
    }
}

/// `<stem>_compressed<ext>` next to `input`.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_compressed.{}", stem, ext.to_string_lossy()),
        None => format!("{}_compressed", stem),
    };
    input.with_file_name(name)
}

pub fn is_lossless_output(path: &Path) -> bool {
    extension_lowercase(path)
        .map(|ext| LOSSLESS_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Warning line for an image written under a lossless extension.
pub fn lossless_warning(output: &Path) -> Option<String> {
    if !is_lossless_output(output) {
        return None;
    }
    let ext = extension_lowercase(output)?.to_ascii_uppercase();
    Some(format!(
        "Warning: Compressing to {} is difficult due to lossless nature. Converting to JPG recommended.",
        ext
    ))
}

/// Settings the pipelines need beyond source, output and target.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub search: SearchParams,
    pub tools: FfmpegTools,
    pub verify_attempts: u32,
}

/// Run the pipeline for `kind` and return the size of the written output.
pub async fn dispatch_to_pipeline(
    kind: MediaKind,
    source: &Path,
    output: &Path,
    target_bytes: u64,
    settings: &PipelineSettings,
) -> CompressResult<u64> {
    debug!(?kind, source = %source.display(), output = %output.display(), "dispatching");
    match kind {
        MediaKind::Image => {
            if let Some(warning) = lossless_warning(output) {
                println!("{}", warning);
                warn!(output = %output.display(), "lossless output extension; writing JPEG data");
            }

            let source = source.to_path_buf();
            let output = output.to_path_buf();
            let params = settings.search.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                compress_image(&source, &output, target_bytes, &params)
            })
            .await
            .map_err(|e| {
                CompressError::encode_failure("image search", format!("worker failed: {}", e))
            })??;

            debug!(
                quality = outcome.quality,
                width = outcome.width,
                height = outcome.height,
                iterations = outcome.iterations(),
                final_size = %format_kb(outcome.final_bytes),
                "image search finished"
            );
            Ok(outcome.final_bytes)
        }
        MediaKind::Video => {
            let outcome = compress_video(
                &settings.tools,
                &settings.tools,
                source,
                output,
                target_bytes,
                settings.verify_attempts,
            )
            .await?;
            debug!(encodes = outcome.encodes, "video encode finished");
            Ok(outcome.final_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        let tables = [
            (IMAGE_EXTENSIONS, MediaKind::Image),
            (VIDEO_EXTENSIONS, MediaKind::Video),
        ];
        for (extensions, kind) in tables {
            for ext in extensions {
                for name in [
                    format!("media/file.{}", ext),
                    format!("media/FILE.{}", ext.to_ascii_uppercase()),
                ] {
                    assert_eq!(classify(Path::new(&name)).unwrap(), kind, "{}", name);
                }
            }
        }
        assert_eq!(classify(Path::new("Clip.MoV")).unwrap(), MediaKind::Video);
    }

    #[test]
    fn test_classify_unsupported() {
        for name in ["notes.txt", "archive.tar.gz", "noext", "image.webp"] {
            let err = classify(Path::new(name)).unwrap_err();
            assert!(matches!(err, CompressError::UnsupportedFormat { .. }), "{}", name);
        }
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/media/holiday.mp4")),
            PathBuf::from("/media/holiday_compressed.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("shot.PNG")),
            PathBuf::from("shot_compressed.PNG")
        );
        assert_eq!(
            default_output_path(Path::new("my.photo.jpeg")),
            PathBuf::from("my.photo_compressed.jpeg")
        );
    }

    #[test]
    fn test_lossless_output() {
        assert!(is_lossless_output(Path::new("out.png")));
        assert!(is_lossless_output(Path::new("out.Bmp")));
        assert!(is_lossless_output(Path::new("out.tiff")));
        assert!(!is_lossless_output(Path::new("out.jpg")));
        assert!(!is_lossless_output(Path::new("out")));
    }

    #[test]
    fn test_lossless_warning_names_the_format() {
        let png = lossless_warning(Path::new("out.png")).unwrap();
        assert!(png.starts_with("Warning: Compressing to PNG is difficult"));
        assert!(lossless_warning(Path::new("out.Bmp")).unwrap().contains("to BMP"));
        assert!(lossless_warning(Path::new("out.tiff")).unwrap().contains("to TIFF"));
        assert_eq!(lossless_warning(Path::new("out.jpeg")), None);
    }
}
