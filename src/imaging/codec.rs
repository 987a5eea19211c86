//! JPEG codec backed by the `image` crate, with resampling from `fitsize-scale`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fitsize_scale::cpu::{resize_rgb, Filter, RgbResizer};
use fitsize_scale::plan::Size;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use tracing::debug;

use super::search::ImageCodec;
use crate::error::{CompressError, CompressResult};

/// Decode `path` and flatten it to 8-bit RGB.
///
/// Alpha and palette images lose their alpha channel, since the target
/// format cannot carry it.
pub fn load_rgb(path: &Path) -> CompressResult<RgbImage> {
    let decoded = image::open(path)?;
    let color = decoded.color();
    if color != ColorType::Rgb8 {
        debug!(?color, has_alpha = color.has_alpha(), "flattening to RGB8");
    }
    Ok(decoded.into_rgb8())
}

/// Baseline JPEG encoder plus a reusable resampler.
pub struct JpegCodec {
    resizer: RgbResizer,
    filter: Filter,
}

impl JpegCodec {
    pub fn new(filter: Filter) -> Self {
        Self {
            resizer: RgbResizer::new(),
            filter,
        }
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(Filter::Lanczos3)
    }
}

impl ImageCodec for JpegCodec {
    fn encode(&mut self, image: &RgbImage, quality: u8, dest: &Path) -> CompressResult<()> {
        let file = File::create(dest).map_err(|e| CompressError::io("writing scratch image", e))?;
        let mut writer = BufWriter::new(file);
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        encoder
            .encode_image(image)
            .map_err(|e| CompressError::encode_failure("jpeg encoder", e.to_string()))?;
        writer
            .flush()
            .map_err(|e| CompressError::io("writing scratch image", e))?;
        Ok(())
    }

    fn resize(&mut self, image: &RgbImage, width: u32, height: u32) -> CompressResult<RgbImage> {
        let src = Size::new(image.width(), image.height());
        let dst = Size::new(width, height);
        let pixels = resize_rgb(&mut self.resizer, image.as_raw(), src, dst, self.filter)
            .map_err(|e| CompressError::encode_failure("image resizer", e.to_string()))?;
        RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            CompressError::encode_failure("image resizer", "resized buffer has the wrong length")
        })
    }
}
