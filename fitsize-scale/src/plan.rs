// SPDX-License-Identifier: MIT
//! # Shrink Plan Computation
//!
//! Computes the next, smaller canvas for a size-targeted image search. The
//! search shrinks both sides by the same factor and always rounds down, so a
//! plan is deterministic for a given input size and factor.
//!
//! ## Design
//!
//! 1. **Size**: width and height in pixels
//! 2. **ShrinkPlan**: input size, factor and the computed output size
//! 3. **Floor**: plans whose output falls under a minimum side are refused
//!
//! Refusing a plan is how callers learn that the search has run out of room.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Number of pixels covered by this size.
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// A single resolution reduction step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShrinkPlan {
    /// Dimensions before the step
    pub input: Size,
    /// Factor applied to both sides
    pub factor: f64,
    /// Dimensions after the step
    pub out: Size,
}

/// Scale both sides by `factor`, truncating toward zero.
pub fn shrink(input: Size, factor: f64) -> Size {
    Size {
        w: (input.w as f64 * factor).floor() as u32,
        h: (input.h as f64 * factor).floor() as u32,
    }
}

/// Build a shrink plan, or `None` when either output side would fall below
/// `min_side` pixels.
///
/// # Arguments
/// * `input` - Current image dimensions
/// * `factor` - Per-side scale factor, expected in (0, 1)
/// * `min_side` - Smallest side length the caller is willing to encode
pub fn shrink_plan(input: Size, factor: f64, min_side: u32) -> Option<ShrinkPlan> {
    let out = shrink(input, factor);
    if out.w < min_side.max(1) || out.h < min_side.max(1) {
        return None;
    }
    Some(ShrinkPlan { input, factor, out })
}
