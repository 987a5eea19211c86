//! # Bitrate Planning
//!
//! Closed-form allocation of a byte budget over a media duration:
//!
//! ```text
//! usable  = target × (1 − 0.05)
//! total   = usable × 8 / duration            (bits per second)
//! audio   = 128k | 96k if total < 1M | 64k if total < 500k
//! video   = total − audio                    (rejected below 1000 bps)
//! ```
//!
//! The 5% margin absorbs container overhead and rate-control slack; there is
//! no measurement of the encoded result here.

use crate::error::{CompressError, CompressResult};
use crate::size::format_mb;

/// Share of the budget held back for container overhead and bitrate variance.
pub const OVERHEAD_MARGIN: f64 = 0.05;

/// Default audio bitrate.
pub const AUDIO_BITRATE_HIGH: u32 = 128_000;
/// Audio bitrate once the total budget drops under [`AUDIO_TIER_MID_BELOW`].
pub const AUDIO_BITRATE_MID: u32 = 96_000;
/// Audio bitrate once the total budget drops under [`AUDIO_TIER_LOW_BELOW`].
pub const AUDIO_BITRATE_LOW: u32 = 64_000;

pub const AUDIO_TIER_MID_BELOW: f64 = 1_000_000.0;
pub const AUDIO_TIER_LOW_BELOW: f64 = 500_000.0;

/// Video bitrates below this produce unusable output.
pub const MIN_VIDEO_BITRATE_BPS: f64 = 1000.0;

/// Bitrate allocation for one two-pass encode.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPlan {
    pub duration_seconds: f64,
    pub usable_bytes: f64,
    pub total_bitrate_bps: f64,
    pub audio_bitrate_bps: u32,
    pub video_bitrate_bps: f64,
}

impl VideoPlan {
    /// Video bitrate as the whole number of bps handed to the encoder.
    pub fn video_bitrate_arg(&self) -> u64 {
        self.video_bitrate_bps as u64
    }

    pub fn print_summary(&self) {
        println!("Video Duration: {:.2}s", self.duration_seconds);
        println!(
            "Target Total Size (w/ 5% buffer): {}",
            format_mb(self.usable_bytes as u64)
        );
        println!(
            "Target Video Bitrate: {}k",
            (self.video_bitrate_bps / 1000.0) as u64
        );
        println!("Target Audio Bitrate: {}k", self.audio_bitrate_bps / 1000);
    }
}

/// Pick the audio bitrate tier for a total bitrate. Thresholds are strict.
pub fn audio_bitrate_for(total_bitrate_bps: f64) -> u32 {
    let mut audio = AUDIO_BITRATE_HIGH;
    if total_bitrate_bps < AUDIO_TIER_MID_BELOW {
        audio = AUDIO_BITRATE_MID;
    }
    if total_bitrate_bps < AUDIO_TIER_LOW_BELOW {
        audio = AUDIO_BITRATE_LOW;
    }
    audio
}

/// Allocate `target_bytes` over `duration_seconds`.
///
/// Fails with `DurationUnavailable` for a non-positive or non-finite
/// duration and with `TargetUnachievable` when too little is left for video.
pub fn plan_bitrates(duration_seconds: f64, target_bytes: u64) -> CompressResult<VideoPlan> {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(CompressError::duration_unavailable(format!(
            "probe reported a duration of {} seconds",
            duration_seconds
        )));
    }

    let usable_bytes = target_bytes as f64 * (1.0 - OVERHEAD_MARGIN);
    let total_bitrate_bps = usable_bytes * 8.0 / duration_seconds;
    let audio_bitrate_bps = audio_bitrate_for(total_bitrate_bps);
    let video_bitrate_bps = total_bitrate_bps - audio_bitrate_bps as f64;

    if video_bitrate_bps < MIN_VIDEO_BITRATE_BPS {
        return Err(CompressError::target_unachievable(format!(
            "{:.0} bps left for video over {:.2}s (minimum {:.0} bps)",
            video_bitrate_bps, duration_seconds, MIN_VIDEO_BITRATE_BPS
        )));
    }

    Ok(VideoPlan {
        duration_seconds,
        usable_bytes,
        total_bitrate_bps,
        audio_bitrate_bps,
        video_bitrate_bps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_sixty_seconds_ten_megabytes() {
        let plan = plan_bitrates(60.0, 10 * MB).unwrap();
        let usable = 10.0 * MB as f64 * 0.95;
        let total = usable * 8.0 / 60.0;
        assert!((plan.usable_bytes - usable).abs() < 1e-6);
        assert!((plan.total_bitrate_bps - total).abs() < 1e-6);
        // ~1.33 Mbps keeps the top audio tier
        assert_eq!(plan.audio_bitrate_bps, 128_000);
        assert!((plan.video_bitrate_bps - (total - 128_000.0)).abs() < 1e-6);
        assert_eq!(plan.video_bitrate_arg(), (total - 128_000.0) as u64);
    }

    #[test]
    fn test_audio_tier_boundaries() {
        assert_eq!(audio_bitrate_for(1_000_000.0), 128_000);
        assert_eq!(audio_bitrate_for(999_999.9), 96_000);
        assert_eq!(audio_bitrate_for(500_000.0), 96_000);
        assert_eq!(audio_bitrate_for(499_999.9), 64_000);
        assert_eq!(audio_bitrate_for(10.0), 64_000);
    }

    #[test]
    fn test_middle_tier_plan() {
        // 10MB over two minutes is about 664 kbps total
        let plan = plan_bitrates(120.0, 10 * MB).unwrap();
        assert_eq!(plan.audio_bitrate_bps, 96_000);
    }

    #[test]
    fn test_rejects_starved_video() {
        // 100KB over an hour leaves nothing after 64k audio
        let err = plan_bitrates(3600.0, 100 * 1024).unwrap_err();
        assert!(matches!(err, CompressError::TargetUnachievable { .. }));
    }

    #[test]
    fn test_viability_floor_is_inclusive() {
        // a budget just over 65_000 bps total leaves about 1000 bps for video
        let duration = 8.0;
        let target = (65_000.0 * duration / 8.0 / 0.95_f64).ceil() as u64;
        let plan = plan_bitrates(duration, target).unwrap();
        assert!(plan.video_bitrate_bps >= MIN_VIDEO_BITRATE_BPS);

        let err = plan_bitrates(duration, target - 200).unwrap_err();
        assert!(matches!(err, CompressError::TargetUnachievable { .. }));
    }

    #[test]
    fn test_rejects_bad_duration() {
        for d in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let err = plan_bitrates(d, 10 * MB).unwrap_err();
            assert!(matches!(err, CompressError::DurationUnavailable { .. }));
        }
    }
}
