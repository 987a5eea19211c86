//! # Video Pipeline
//!
//! Duration probe, closed-form bitrate plan, then a two-pass encode through
//! an external encoder. The probe and encoder sit behind traits so the
//! pipeline can run against fakes.

pub mod ffmpeg;
pub mod plan;
pub mod traits;
pub mod two_pass;

pub use ffmpeg::{null_device, FfmpegTools};
pub use plan::{audio_bitrate_for, plan_bitrates, VideoPlan};
pub use traits::{MediaProbe, Pass, PassRequest, VideoEncoder};
pub use two_pass::{compress_video, plan_video, run_two_pass, VideoOutcome};
