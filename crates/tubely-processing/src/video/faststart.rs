//! Fast-start remuxing via FFmpeg.
//!
//! Moves the `moov` atom ahead of the media data with a stream copy, so
//! players can start before the whole file has downloaded.

use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tubely_core::{AppError, AppResult};

use crate::process::run_tool;

const FAST_START_SUFFIX: &str = ".processing";

/// Where the remuxed copy of `input` is written.
pub fn fast_start_output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(FAST_START_SUFFIX);
    PathBuf::from(name)
}

/// Rewrites a media file's container for progressive playback.
#[async_trait]
pub trait FastStartRemuxer: Send + Sync {
    /// Path the remuxed copy of `input` will be written to.
    fn output_path(&self, input: &Path) -> PathBuf {
        fast_start_output_path(input)
    }

    /// Write a remuxed copy of `input` and return its path. `input` is left as is.
    async fn remux(&self, input: &Path) -> AppResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl FastStartRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path) -> AppResult<PathBuf> {
        let start = std::time::Instant::now();
        let output_path = self.output_path(input);

        let args: [&OsStr; 13] = [
            OsStr::new("-nostdin"),
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            OsStr::new("-y"),
            output_path.as_os_str(),
        ];

        run_tool(&self.ffmpeg_path, args, self.timeout)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Fast-start remux failed"
                );
                AppError::RemuxFailure(e.to_string())
            })?;

        tracing::info!(
            output = %output_path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fast-start remux completed"
        );

        Ok(output_path)
    }
}
