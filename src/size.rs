//! # Size Parsing
//!
//! Converts human-readable size tokens (`5MB`, `500kb`, `1.5GB`, `2048`) into
//! exact byte counts. Units are binary: 1 KB is 1024 bytes.

use std::fmt;

use crate::error::{CompressError, CompressResult};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Unit suffixes in match order. Two-letter units come first so that "KB"
/// is never read as a number ending in "K" followed by "B".
const UNITS: [(&str, f64); 4] = [("GB", GIB), ("MB", MIB), ("KB", KIB), ("B", 1.0)];

/// The target budget for a run, parsed once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Token exactly as the user typed it
    pub raw_token: String,
    /// Budget in bytes
    pub bytes: u64,
}

impl TargetSpec {
    pub fn parse(token: &str) -> CompressResult<Self> {
        Ok(Self {
            raw_token: token.to_string(),
            bytes: parse_size(token)?,
        })
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.raw_token.trim(), self.bytes)
    }
}

/// Parse a size token like "5MB", "500KB", "1.5GB" or "100" into bytes.
///
/// Matching is case-insensitive; a token without a unit is already in bytes.
/// Fractional values are floored to a whole number of bytes.
pub fn parse_size(token: &str) -> CompressResult<u64> {
    let normalized = token.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(CompressError::invalid_size(token, "empty size"));
    }

    let (number, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, mult)| normalized.strip_suffix(suffix).map(|n| (n, *mult)))
        .unwrap_or((normalized.as_str(), 1.0));

    let number = number.trim();
    let value: f64 = number
        .parse()
        .map_err(|_| CompressError::invalid_size(token, format!("cannot parse number '{}'", number)))?;

    if !value.is_finite() || value < 0.0 {
        return Err(CompressError::invalid_size(
            token,
            "size must be a finite, non-negative number",
        ));
    }

    let bytes = (value * multiplier).floor();
    if bytes > u64::MAX as f64 {
        return Err(CompressError::invalid_size(token, "size is too large"));
    }
    Ok(bytes as u64)
}

/// Render a byte count as megabytes with two decimals, e.g. "4.77 MB".
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB)
}

/// Render a byte count as kilobytes with two decimals, e.g. "512.00 KB".
pub fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / KIB)
}
