//! Two-pass encode driver and the end-to-end video pipeline.

use std::path::Path;

use tracing::{debug, info, warn};

use super::plan::{plan_bitrates, VideoPlan};
use super::traits::{MediaProbe, Pass, PassRequest, VideoEncoder};
use crate::error::{CompressError, CompressResult};
use crate::size::format_mb;

/// File name prefix of the rate-control log inside the pass-log directory.
pub const PASSLOG_NAME: &str = "ffmpeg2pass";

/// Fraction of the scaled budget used when a verified encode overshoots.
pub const VERIFY_SLACK: f64 = 0.97;

/// Result of the video pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoOutcome {
    /// Plan used for the encode that produced the output.
    pub plan: VideoPlan,
    pub final_bytes: u64,
    /// Number of complete two-pass encodes run.
    pub encodes: u32,
}

/// Probe `source` and plan bitrates for `target_bytes`.
pub async fn plan_video<P: MediaProbe + ?Sized>(
    probe: &P,
    source: &Path,
    target_bytes: u64,
) -> CompressResult<VideoPlan> {
    let duration = probe.probe_duration(source).await?;
    debug!(duration, source = %source.display(), "probed duration");
    plan_bitrates(duration, target_bytes)
}

/// Run the analysis pass then the final pass with identical video bitrate.
///
/// The rate-control log is written under `passlog_dir`, which the caller
/// owns and removes.
pub async fn run_two_pass<E: VideoEncoder + ?Sized>(
    encoder: &E,
    source: &Path,
    output: &Path,
    plan: &VideoPlan,
    passlog_dir: &Path,
) -> CompressResult<()> {
    let analysis = PassRequest {
        input: source.to_path_buf(),
        output: output.to_path_buf(),
        video_bitrate_bps: plan.video_bitrate_arg(),
        audio_bitrate_bps: plan.audio_bitrate_bps,
        pass: Pass::Analysis,
        passlog_prefix: passlog_dir.join(PASSLOG_NAME),
    };

    println!("Running Pass 1 (Analysis)...");
    encoder.encode_pass(&analysis).await?;

    println!("Running Pass 2 (Compression)...");
    let last = PassRequest {
        pass: Pass::Final,
        ..analysis
    };
    encoder.encode_pass(&last).await
}

/// One complete two-pass encode with a private pass-log directory.
///
/// The pass-log directory is created beside `output` and the final pass is
/// staged inside it, so a failed or interrupted encode never touches an
/// existing `output`. Returns the size of the promoted output.
async fn encode_once<E: VideoEncoder + ?Sized>(
    encoder: &E,
    source: &Path,
    output: &Path,
    plan: &VideoPlan,
) -> CompressResult<u64> {
    let parent = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let passlog_dir = tempfile::Builder::new()
        .prefix(".fitsize-passlog-")
        .tempdir_in(parent)
        .map_err(|e| CompressError::io("creating pass log directory", e))?;
    let staged = match output.file_name() {
        Some(name) => passlog_dir.path().join(name),
        None => passlog_dir.path().join("output.mp4"),
    };

    let result = match run_two_pass(encoder, source, &staged, plan, passlog_dir.path()).await {
        Ok(()) => promote(encoder, &staged, output).await,
        Err(e) => Err(e),
    };

    let dir_path = passlog_dir.path().to_path_buf();
    if let Err(e) = passlog_dir.close() {
        warn!(error = %e, dir = %dir_path.display(), "could not remove pass log directory");
    }
    result
}

/// Move a finished encode from `staged` over `output`.
async fn promote<E: VideoEncoder + ?Sized>(
    encoder: &E,
    staged: &Path,
    output: &Path,
) -> CompressResult<u64> {
    let metadata = tokio::fs::metadata(staged).await.map_err(|e| {
        CompressError::encode_failure(
            encoder.name(),
            format!("no output at {}: {}", staged.display(), e),
        )
    })?;
    tokio::fs::rename(staged, output)
        .await
        .map_err(|e| CompressError::io("replacing the output file", e))?;
    debug!(output = %output.display(), bytes = metadata.len(), "promoted encoded output");
    Ok(metadata.len())
}

/// Probe, plan, and encode `source` into `output` under `target_bytes`.
///
/// With `verify_attempts > 0`, an output larger than the target triggers a
/// re-encode with the budget scaled by `target / actual × 0.97`, up to
/// `verify_attempts` extra encodes. The last output is kept either way.
pub async fn compress_video<P, E>(
    probe: &P,
    encoder: &E,
    source: &Path,
    output: &Path,
    target_bytes: u64,
    verify_attempts: u32,
) -> CompressResult<VideoOutcome>
where
    P: MediaProbe + ?Sized,
    E: VideoEncoder + ?Sized,
{
    let mut plan = plan_video(probe, source, target_bytes).await?;
    plan.print_summary();
    encoder.validate().await?;

    let mut final_bytes = encode_once(encoder, source, output, &plan).await?;
    let mut encodes = 1;
    let mut budget = target_bytes;

    while final_bytes > target_bytes && encodes <= verify_attempts {
        let ratio = target_bytes as f64 / final_bytes as f64;
        budget = (budget as f64 * ratio * VERIFY_SLACK).floor() as u64;
        println!(
            "Output is {} over target. Retrying with a {} budget ({}/{})...",
            format_mb(final_bytes - target_bytes),
            format_mb(budget),
            encodes,
            verify_attempts
        );

        plan = match plan_bitrates(plan.duration_seconds, budget) {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "cannot replan a smaller encode; keeping the last output");
                break;
            }
        };
        plan.print_summary();
        final_bytes = encode_once(encoder, source, output, &plan).await?;
        encodes += 1;
    }

    if final_bytes > target_bytes {
        info!(final_bytes, target_bytes, "encoded output is over the target");
    }

    Ok(VideoOutcome {
        plan,
        final_bytes,
        encodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct FixedProbe(f64);

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn probe_duration(&self, _path: &Path) -> CompressResult<f64> {
            Ok(self.0)
        }
    }

    /// Writes an output sized from the requested bitrate scaled by `overshoot`.
    struct SizedEncoder {
        duration: f64,
        overshoot: f64,
        requests: Mutex<Vec<PassRequest>>,
    }

    impl SizedEncoder {
        fn new(duration: f64, overshoot: f64) -> Self {
            Self {
                duration,
                overshoot,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VideoEncoder for SizedEncoder {
        fn name(&self) -> &str {
            "sized"
        }

        async fn encode_pass(&self, request: &PassRequest) -> CompressResult<()> {
            self.requests.lock().unwrap().push(request.clone());
            assert!(request.passlog_prefix.parent().unwrap().is_dir());
            if request.pass == Pass::Final {
                let bits = (request.video_bitrate_bps + request.audio_bitrate_bps as u64) as f64
                    * self.duration;
                let bytes = (bits / 8.0 * self.overshoot) as usize;
                std::fs::write(&request.output, vec![0u8; bytes]).unwrap();
            }
            Ok(())
        }
    }

    const MB: u64 = 1024 * 1024;

    #[tokio::test]
    async fn test_two_passes_share_bitrate_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = SizedEncoder::new(60.0, 1.0);

        let outcome = compress_video(
            &FixedProbe(60.0),
            &encoder,
            Path::new("in.mp4"),
            &output,
            10 * MB,
            0,
        )
        .await
        .unwrap();

        let requests = encoder.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].pass, Pass::Analysis);
        assert_eq!(requests[1].pass, Pass::Final);
        assert_eq!(requests[0].video_bitrate_bps, requests[1].video_bitrate_bps);
        assert_eq!(requests[0].passlog_prefix, requests[1].passlog_prefix);
        assert_eq!(
            requests[0].passlog_prefix.file_name().unwrap(),
            PASSLOG_NAME
        );
        // pass log directory is gone afterwards
        assert!(!requests[0].passlog_prefix.parent().unwrap().exists());

        assert_eq!(outcome.encodes, 1);
        assert!(outcome.final_bytes <= 10 * MB);
    }

    #[tokio::test]
    async fn test_unachievable_target_runs_no_encode() {
        let encoder = SizedEncoder::new(3600.0, 1.0);
        let err = compress_video(
            &FixedProbe(3600.0),
            &encoder,
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            100 * 1024,
            0,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CompressError::TargetUnachievable { .. }));
        assert!(encoder.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overshoot_kept_without_verification() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = SizedEncoder::new(60.0, 1.2);

        let outcome = compress_video(
            &FixedProbe(60.0),
            &encoder,
            Path::new("in.mp4"),
            &output,
            10 * MB,
            0,
        )
        .await
        .unwrap();

        assert_eq!(outcome.encodes, 1);
        assert!(outcome.final_bytes > 10 * MB);
        assert_eq!(encoder.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_verification_retries_with_smaller_budget() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let encoder = SizedEncoder::new(60.0, 1.2);

        let outcome = compress_video(
            &FixedProbe(60.0),
            &encoder,
            Path::new("in.mp4"),
            &output,
            10 * MB,
            3,
        )
        .await
        .unwrap();

        assert_eq!(outcome.encodes, 2);
        assert!(outcome.final_bytes <= 10 * MB);

        let requests = encoder.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests[2].video_bitrate_bps < requests[0].video_bitrate_bps);
        // each encode gets its own log directory
        assert_ne!(requests[0].passlog_prefix, requests[2].passlog_prefix);
    }

    #[tokio::test]
    async fn test_missing_output_is_encode_failure() {
        struct SilentEncoder;

        #[async_trait]
        impl VideoEncoder for SilentEncoder {
            fn name(&self) -> &str {
                "silent"
            }

            async fn encode_pass(&self, _request: &PassRequest) -> CompressResult<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let output: PathBuf = dir.path().join("never.mp4");
        let err = compress_video(
            &FixedProbe(60.0),
            &SilentEncoder,
            Path::new("in.mp4"),
            &output,
            10 * MB,
            0,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CompressError::EncodeFailure { .. }));
    }
}
