//! Common test utilities for the fitsize integration tests
//!
//! Image fixtures that resist compression, and fake probe/encoder services
//! for driving the video pipeline without ffmpeg.

#![allow(dead_code)]

/// Image and file fixtures
pub mod fixtures {
    use image::{Rgb, RgbImage};
    use std::path::{Path, PathBuf};

    /// Deterministic RGB noise. Noise barely compresses, so small targets
    /// force the search all the way into resizing.
    pub fn noisy_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        RgbImage::from_fn(width, height, |_, _| {
            let mut next = || {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            };
            Rgb([next(), next(), next()])
        })
    }

    /// Write a noisy PNG into `dir` and return its path.
    pub fn write_noisy_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        noisy_rgb(width, height, width ^ height)
            .save(&path)
            .expect("write png fixture");
        path
    }

    /// Write `len` zero bytes into `dir/name`.
    pub fn write_blob(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; len]).expect("write blob fixture");
        path
    }

    /// Names of leftover scratch files in `dir`.
    pub fn scratch_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }
}

/// Fake media services
pub mod fakes {
    use async_trait::async_trait;
    use fitsize::error::{CompressError, CompressResult};
    use fitsize::video::{MediaProbe, Pass, PassRequest, VideoEncoder};
    use std::path::Path;
    use std::sync::Mutex;

    /// Probe that always reports the same result.
    pub struct FakeProbe {
        duration: Option<f64>,
    }

    impl FakeProbe {
        pub fn seconds(duration: f64) -> Self {
            Self {
                duration: Some(duration),
            }
        }

        pub fn failing() -> Self {
            Self { duration: None }
        }
    }

    #[async_trait]
    impl MediaProbe for FakeProbe {
        async fn probe_duration(&self, _path: &Path) -> CompressResult<f64> {
            self.duration
                .ok_or_else(|| CompressError::duration_unavailable("fake probe has no duration"))
        }
    }

    /// Encoder that records every request and, on the final pass, writes an
    /// output sized as `bitrate × duration × overshoot`, floored at
    /// `min_output_bytes`.
    pub struct FakeEncoder {
        pub duration: f64,
        pub overshoot: f64,
        pub min_output_bytes: usize,
        pub fail_on: Option<Pass>,
        pub requests: Mutex<Vec<PassRequest>>,
        /// Whether the pass-log directory existed during each request.
        pub log_dir_present: Mutex<Vec<bool>>,
    }

    impl FakeEncoder {
        pub fn new(duration: f64) -> Self {
            Self {
                duration,
                overshoot: 1.0,
                min_output_bytes: 0,
                fail_on: None,
                requests: Mutex::new(Vec::new()),
                log_dir_present: Mutex::new(Vec::new()),
            }
        }

        pub fn with_overshoot(mut self, overshoot: f64) -> Self {
            self.overshoot = overshoot;
            self
        }

        /// Outputs never get smaller than `bytes`, whatever the bitrate.
        pub fn with_min_output(mut self, bytes: usize) -> Self {
            self.min_output_bytes = bytes;
            self
        }

        pub fn failing_on(mut self, pass: Pass) -> Self {
            self.fail_on = Some(pass);
            self
        }

        pub fn requests(&self) -> Vec<PassRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoEncoder for FakeEncoder {
        fn name(&self) -> &str {
            "fake"
        }

        async fn encode_pass(&self, request: &PassRequest) -> CompressResult<()> {
            self.requests.lock().unwrap().push(request.clone());
            let dir_present = request
                .passlog_prefix
                .parent()
                .map(|dir| dir.is_dir())
                .unwrap_or(false);
            self.log_dir_present.lock().unwrap().push(dir_present);

            if self.fail_on == Some(request.pass) {
                return Err(CompressError::encode_failure_with_stderr(
                    "fake",
                    format!("pass {} exited with status 1", request.pass.number()),
                    "Error while opening encoder",
                ));
            }

            if request.pass == Pass::Final {
                let bits = (request.video_bitrate_bps + request.audio_bitrate_bps as u64) as f64
                    * self.duration;
                let bytes = ((bits / 8.0 * self.overshoot) as usize).max(self.min_output_bytes);
                std::fs::write(&request.output, vec![0u8; bytes])?;
            }
            Ok(())
        }
    }
}
