//! FFmpeg/FFprobe-backed probe and encoder.
//!
//! Each invocation is a child process bounded by a timeout. When the timeout
//! fires the future is dropped and `kill_on_drop` takes the child down.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::traits::{MediaProbe, Pass, PassRequest, VideoEncoder};
use crate::error::{CompressError, CompressResult};

/// Lines of encoder stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Null sink for the analysis pass.
pub fn null_device() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}

enum RunError {
    NotFound,
    Io(std::io::Error),
    TimedOut,
}

/// Probe and two-pass encoder using the ffmpeg command line tools.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Duration,
    verbose: bool,
}

impl FfmpegTools {
    pub fn new(
        ffmpeg_path: impl Into<PathBuf>,
        ffprobe_path: impl Into<PathBuf>,
        timeout_secs: u64,
        verbose: bool,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout: Duration::from_secs(timeout_secs),
            verbose,
        }
    }

    /// Builds ffprobe arguments for a duration query.
    fn build_probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "json".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Builds ffmpeg arguments for one pass of a two-pass encode.
    fn build_pass_args(&self, request: &PassRequest) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-nostdin".to_string()];

        if !self.verbose {
            args.extend([
                "-hide_banner".to_string(),
                "-loglevel".to_string(),
                "error".to_string(),
            ]);
        }

        args.extend([
            "-i".to_string(),
            request.input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-b:v".to_string(),
            request.video_bitrate_bps.to_string(),
            "-pass".to_string(),
            request.pass.number().to_string(),
            "-passlogfile".to_string(),
            request.passlog_prefix.to_string_lossy().to_string(),
        ]);

        match request.pass {
            Pass::Analysis => {
                args.extend([
                    "-an".to_string(),
                    "-f".to_string(),
                    "mp4".to_string(),
                    null_device().to_string(),
                ]);
            }
            Pass::Final => {
                args.extend([
                    "-c:a".to_string(),
                    "aac".to_string(),
                    "-b:a".to_string(),
                    request.audio_bitrate_bps.to_string(),
                    request.output.to_string_lossy().to_string(),
                ]);
            }
        }

        args
    }

    /// Parses ffprobe JSON output into a duration in seconds.
    fn parse_duration_output(output: &str) -> CompressResult<f64> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            CompressError::duration_unavailable(format!("could not parse ffprobe output: {}", e))
        })?;

        let raw = probe
            .format
            .and_then(|f| f.duration)
            .ok_or_else(|| CompressError::duration_unavailable("ffprobe reported no duration"))?;

        let seconds: f64 = raw.trim().parse().map_err(|_| {
            CompressError::duration_unavailable(format!("ffprobe duration '{}' is not a number", raw))
        })?;

        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(CompressError::duration_unavailable(format!(
                "ffprobe duration {} is not positive",
                seconds
            )));
        }
        Ok(seconds)
    }

    async fn run(&self, program: &Path, args: &[String], capture: bool) -> Result<Output, RunError> {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        if !capture {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        debug!(program = %program.display(), ?args, "spawning");
        match timeout(self.timeout, cmd.output()).await {
            Err(_) => Err(RunError::TimedOut),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(RunError::NotFound),
            Ok(Err(e)) => Err(RunError::Io(e)),
            Ok(Ok(output)) => Ok(output),
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl MediaProbe for FfmpegTools {
    async fn probe_duration(&self, path: &Path) -> CompressResult<f64> {
        let args = Self::build_probe_args(path);
        let output = self
            .run(&self.ffprobe_path, &args, true)
            .await
            .map_err(|e| match e {
                RunError::NotFound => CompressError::duration_unavailable(format!(
                    "ffprobe not found at {} (is FFmpeg installed?)",
                    self.ffprobe_path.display()
                )),
                RunError::Io(e) => {
                    CompressError::duration_unavailable(format!("could not run ffprobe: {}", e))
                }
                RunError::TimedOut => CompressError::duration_unavailable(format!(
                    "ffprobe timed out after {}s",
                    self.timeout.as_secs()
                )),
            })?;

        if !output.status.success() {
            return Err(CompressError::duration_unavailable(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr).trim()
            )));
        }

        Self::parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl VideoEncoder for FfmpegTools {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode_pass(&self, request: &PassRequest) -> CompressResult<()> {
        let args = self.build_pass_args(request);
        let pass = request.pass.number();
        let output = self
            .run(&self.ffmpeg_path, &args, !self.verbose)
            .await
            .map_err(|e| match e {
                RunError::NotFound => CompressError::encode_failure(
                    "ffmpeg",
                    format!("binary not found at {}", self.ffmpeg_path.display()),
                ),
                RunError::Io(e) => {
                    CompressError::encode_failure("ffmpeg", format!("could not run ffmpeg: {}", e))
                }
                RunError::TimedOut => CompressError::encode_failure(
                    "ffmpeg",
                    format!("pass {} timed out after {}s", pass, self.timeout.as_secs()),
                ),
            })?;

        if !output.status.success() {
            return Err(CompressError::encode_failure_with_stderr(
                "ffmpeg",
                format!("pass {} exited with {}", pass, output.status),
                stderr_tail(&output.stderr),
            ));
        }
        Ok(())
    }

    async fn validate(&self) -> CompressResult<()> {
        let args = ["-version".to_string()];
        match self.run(&self.ffmpeg_path, &args, true).await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(CompressError::encode_failure(
                "ffmpeg",
                format!("'-version' exited with {}", output.status),
            )),
            Err(RunError::NotFound) => Err(CompressError::encode_failure(
                "ffmpeg",
                format!("binary not found at {}", self.ffmpeg_path.display()),
            )),
            Err(RunError::Io(e)) => Err(CompressError::encode_failure(
                "ffmpeg",
                format!("could not run ffmpeg: {}", e),
            )),
            Err(RunError::TimedOut) => Err(CompressError::encode_failure(
                "ffmpeg",
                "'-version' timed out",
            )),
        }
    }
}
