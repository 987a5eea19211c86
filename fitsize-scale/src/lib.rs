// SPDX-License-Identifier: MIT
//! # fitsize-scale: Resolution Reduction for Size-Targeted Compression
//!
//! This crate provides the resolution side of `fitsize`'s image search: it
//! decides how large the next, smaller canvas is and performs the resample.
//!
//! ## Key Components
//!
//! - [`plan`]: shrink plans (per-side factor, truncating, with a minimum side)
//! - [`cpu`]: CPU resampling of RGB8 buffers using fast_image_resize
//!
//! ## Usage Example
//!
//! ```rust
//! use fitsize_scale::{cpu::{resize_rgb, Filter}, plan::{shrink_plan, Size}};
//!
//! let input = Size::new(40, 30);
//! let plan = shrink_plan(input, 0.9, 16).expect("room to shrink");
//! assert_eq!(plan.out, Size::new(36, 27));
//!
//! let pixels = vec![128u8; (input.w * input.h * 3) as usize];
//! let mut resizer = fast_image_resize::Resizer::new();
//! let out = resize_rgb(&mut resizer, &pixels, input, plan.out, Filter::Lanczos3).unwrap();
//! assert_eq!(out.len(), (36 * 27 * 3) as usize);
//! ```

pub mod cpu;
pub mod plan;
