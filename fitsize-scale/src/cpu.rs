// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGB8 in → RGB8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::plan::Size;

pub use fir::Resizer as RgbResizer;

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall,
    EmptyImage,
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall => write!(f, "Output buffer too small"),
            ScaleError::EmptyImage => write!(f, "Cannot resize to or from an empty image"),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resampling filter used for downscaling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    Bilinear,
    CatmullRom,
    #[default]
    Lanczos3,
}

impl Filter {
    fn to_alg(self) -> ResizeAlg {
        match self {
            Filter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            Filter::CatmullRom => ResizeAlg::Convolution(FilterType::CatmullRom),
            Filter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
        }
    }
}

/// Resize a tightly packed RGB8 buffer.
/// `dst` must hold at least `dst_size.w * dst_size.h * 3` bytes.
pub fn scale_rgb_cpu(
    resizer: &mut Resizer,
    src_rgb: &[u8],
    src: Size,
    dst: &mut [u8],
    dst_size: Size,
    filter: Filter,
) -> Result<(), ScaleError> {
    if src.area() == 0 || dst_size.area() == 0 {
        return Err(ScaleError::EmptyImage);
    }
    let dst_len = (dst_size.w as usize) * (dst_size.h as usize) * 3;
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall);
    }

    let src_view = TypedImageRef::<U8x3>::from_buffer(src.w, src.h, src_rgb)?;
    let mut dst_image = TypedImage::<U8x3>::from_buffer(dst_size.w, dst_size.h, &mut dst[..dst_len])?;

    let opts = ResizeOptions::new().resize_alg(filter.to_alg());
    resizer.resize_typed::<U8x3>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}

/// Convenience wrapper that allocates the output buffer.
pub fn resize_rgb(
    resizer: &mut Resizer,
    src_rgb: &[u8],
    src: Size,
    dst_size: Size,
    filter: Filter,
) -> Result<Vec<u8>, ScaleError> {
    let mut out = vec![0u8; dst_size.w as usize * dst_size.h as usize * 3];
    scale_rgb_cpu(resizer, src_rgb, src, &mut out, dst_size, filter)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: Size, rgb: [u8; 3]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size.area() as usize * 3);
        for _ in 0..size.area() {
            buf.extend_from_slice(&rgb);
        }
        buf
    }

    #[test]
    fn downscale_keeps_solid_color() {
        let src = Size::new(64, 48);
        let dst = Size::new(57, 43);
        let mut resizer = Resizer::new();
        let out = resize_rgb(&mut resizer, &solid(src, [200, 40, 10]), src, dst, Filter::default()).unwrap();
        assert_eq!(out.len(), 57 * 43 * 3);
        for px in out.chunks_exact(3) {
            assert!((px[0] as i32 - 200).abs() <= 1);
            assert!((px[1] as i32 - 40).abs() <= 1);
            assert!((px[2] as i32 - 10).abs() <= 1);
        }
    }

    #[test]
    fn rejects_short_destination() {
        let src = Size::new(8, 8);
        let mut resizer = Resizer::new();
        let mut dst = vec![0u8; 10];
        let err = scale_rgb_cpu(&mut resizer, &solid(src, [0, 0, 0]), src, &mut dst, Size::new(4, 4), Filter::Bilinear);
        assert!(matches!(err, Err(ScaleError::BufferTooSmall)));
    }

    #[test]
    fn rejects_empty_sizes() {
        let mut resizer = Resizer::new();
        let err = resize_rgb(&mut resizer, &[], Size::new(0, 5), Size::new(1, 1), Filter::Bilinear);
        assert!(matches!(err, Err(ScaleError::EmptyImage)));
    }
}
