//! # Image Pipeline
//!
//! Quality-then-resolution search toward a byte budget, plus the JPEG codec
//! it drives in production.

pub mod codec;
pub mod search;

use std::path::Path;

pub use codec::{load_rgb, JpegCodec};
pub use search::{
    search_to_target, ImageCodec, ImageSearchState, Move, SearchOutcome, SearchParams, SearchStep,
};

use crate::error::CompressResult;

/// Decode `source`, search for an encode under `target_bytes`, and write it
/// to `output`.
pub fn compress_image(
    source: &Path,
    output: &Path,
    target_bytes: u64,
    params: &SearchParams,
) -> CompressResult<SearchOutcome> {
    let image = load_rgb(source)?;
    let mut codec = JpegCodec::default();
    search_to_target(&mut codec, image, target_bytes, params, output)
}
