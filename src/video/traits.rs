//! Service traits for the video pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::CompressResult;

/// Which half of a two-pass encode a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Rate-control analysis; the encoded output is discarded.
    Analysis,
    /// The real encode, muxed with audio.
    Final,
}

impl Pass {
    pub fn number(self) -> u8 {
        match self {
            Pass::Analysis => 1,
            Pass::Final => 2,
        }
    }
}

/// One encoder invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PassRequest {
    pub input: PathBuf,
    /// Destination of the final encode. The analysis pass never writes here.
    pub output: PathBuf,
    pub video_bitrate_bps: u64,
    pub audio_bitrate_bps: u32,
    pub pass: Pass,
    /// Prefix for the rate-control log shared by both passes.
    pub passlog_prefix: PathBuf,
}

/// Reports the duration of a media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> CompressResult<f64>;
}

/// Runs a single encoder pass.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    async fn encode_pass(&self, request: &PassRequest) -> CompressResult<()>;

    /// Checks that the encoder can run at all.
    async fn validate(&self) -> CompressResult<()> {
        Ok(())
    }
}
