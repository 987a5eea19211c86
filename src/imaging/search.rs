//! # Image Size Search
//!
//! Greedy two-phase degradation toward a byte budget: lower the JPEG quality
//! in fixed steps first, and only once the quality floor is reached shrink
//! the resolution and restart from a reset quality.
//!
//! ```text
//! encode(q=95) ─▶ over? ─▶ q-=5 ─▶ ... ─▶ q=5 over? ─▶ shrink 0.9, q=85 ─▶ ...
//!      │                                                        │
//!      └──────────── size ≤ target ─▶ promote scratch ◀─────────┘
//! ```
//!
//! The loop is bounded twice: by a minimum side length and by an encode
//! budget. Hitting either ends the search with `TargetUnachievable`.

use std::path::Path;

use fitsize_scale::plan::{shrink_plan, Size};
use image::RgbImage;
use tracing::debug;

use crate::error::{CompressError, CompressResult};
use crate::size::format_kb;

/// Encode/resize service the search drives.
///
/// Implementations must write the whole artifact to `dest`, replacing
/// anything already there; the search measures the file afterwards.
pub trait ImageCodec {
    /// Encode `image` at `quality` into `dest`.
    fn encode(&mut self, image: &RgbImage, quality: u8, dest: &Path) -> CompressResult<()>;

    /// Resample `image` to exactly `width` x `height`.
    fn resize(&mut self, image: &RgbImage, width: u32, height: u32) -> CompressResult<RgbImage>;
}

/// Tuning for the quality/resolution search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Quality of the first encode
    pub initial_quality: u8,
    /// Lowest quality tried before resizing
    pub quality_floor: u8,
    /// Quality decrement per over-budget encode
    pub quality_step: u8,
    /// Per-side factor applied on each resize
    pub resize_factor: f64,
    /// Quality used for the first encode after a resize
    pub reset_quality: u8,
    /// Smallest side length the search will produce
    pub min_dimension: u32,
    /// Total encode budget
    pub max_iterations: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            initial_quality: 95,
            quality_floor: 5,
            quality_step: 5,
            resize_factor: 0.9,
            reset_quality: 85,
            min_dimension: 16,
            max_iterations: 500,
        }
    }
}

/// What the search does after an encode that was still over budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Re-encode the same pixels at a lower quality.
    LowerQuality { quality: u8 },
    /// Resample to a smaller canvas and re-encode at the reset quality.
    Shrink { width: u32, height: u32, quality: u8 },
}

/// Mutable state of one search, advanced once per encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSearchState {
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub last_encoded_bytes: u64,
}

impl ImageSearchState {
    pub fn new(width: u32, height: u32, params: &SearchParams) -> Self {
        Self {
            quality: params.initial_quality,
            width,
            height,
            last_encoded_bytes: 0,
        }
    }

    /// Decide the next move after an over-budget encode.
    ///
    /// Fails with `TargetUnachievable` once the canvas cannot shrink without
    /// a side dropping below `min_dimension`.
    pub fn next_move(&self, params: &SearchParams) -> CompressResult<Move> {
        if self.quality > params.quality_floor {
            let quality = self
                .quality
                .saturating_sub(params.quality_step)
                .max(params.quality_floor);
            return Ok(Move::LowerQuality { quality });
        }

        let current = Size::new(self.width, self.height);
        match shrink_plan(current, params.resize_factor, params.min_dimension) {
            Some(plan) => {
                debug!(from = ?plan.input, factor = plan.factor, to = ?plan.out, "shrinking canvas");
                Ok(Move::Shrink {
                    width: plan.out.w,
                    height: plan.out.h,
                    quality: params.reset_quality,
                })
            }
            None => Err(CompressError::target_unachievable(format!(
                "smallest encode was {} at {}x{}; shrinking further would go below {} px",
                format_kb(self.last_encoded_bytes),
                self.width,
                self.height,
                params.min_dimension
            ))),
        }
    }

    pub fn apply(&mut self, mv: Move) {
        match mv {
            Move::LowerQuality { quality } => self.quality = quality,
            Move::Shrink {
                width,
                height,
                quality,
            } => {
                self.width = width;
                self.height = height;
                self.quality = quality;
            }
        }
    }
}

/// One encode of the search, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStep {
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub encoded_bytes: u64,
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub final_bytes: u64,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub steps: Vec<SearchStep>,
}

impl SearchOutcome {
    pub fn iterations(&self) -> usize {
        self.steps.len()
    }

    /// Number of resolution reductions the search performed.
    pub fn resizes(&self) -> usize {
        self.steps
            .windows(2)
            .filter(|w| (w[0].width, w[0].height) != (w[1].width, w[1].height))
            .count()
    }
}

/// Search for an encode of `image` that fits in `target_bytes` and write it
/// to `output`.
///
/// Every attempt goes to one scratch file next to `output`; only the
/// accepted attempt is moved into place, replacing any existing file. On
/// failure the scratch file is removed and `output` is left untouched.
pub fn search_to_target<C: ImageCodec + ?Sized>(
    codec: &mut C,
    image: RgbImage,
    target_bytes: u64,
    params: &SearchParams,
    output: &Path,
) -> CompressResult<SearchOutcome> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CompressError::target_unachievable("image has no pixels"));
    }

    let scratch_dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let scratch = tempfile::Builder::new()
        .prefix(".fitsize-")
        .suffix(".jpg.part")
        .tempfile_in(scratch_dir)
        .map_err(|e| CompressError::io("creating scratch file", e))?;

    let mut image = image;
    let mut state = ImageSearchState::new(image.width(), image.height(), params);
    let mut steps: Vec<SearchStep> = Vec::new();

    loop {
        if steps.len() >= params.max_iterations as usize {
            return Err(CompressError::target_unachievable(format!(
                "no encode fit in {} bytes after {} attempts",
                target_bytes,
                steps.len()
            )));
        }

        codec.encode(&image, state.quality, scratch.path())?;
        let size = std::fs::metadata(scratch.path())
            .map_err(|e| CompressError::io("measuring scratch file", e))?
            .len();
        state.last_encoded_bytes = size;

        println!(
            "Image Pass | Quality: {} | Size: {}",
            state.quality,
            format_kb(size)
        );
        debug!(
            quality = state.quality,
            width = state.width,
            height = state.height,
            size,
            target_bytes,
            "image encode"
        );
        steps.push(SearchStep {
            quality: state.quality,
            width: state.width,
            height: state.height,
            encoded_bytes: size,
        });

        if size <= target_bytes {
            break;
        }

        let mv = state.next_move(params)?;
        if let Move::Shrink { width, height, .. } = mv {
            println!("Quality lowest. Resizing to {}x{}", width, height);
            image = codec.resize(&image, width, height)?;
        }
        state.apply(mv);
    }

    scratch.persist(output)?;

    Ok(SearchOutcome {
        final_bytes: state.last_encoded_bytes,
        quality: state.quality,
        width: state.width,
        height: state.height,
        steps,
    })
}
