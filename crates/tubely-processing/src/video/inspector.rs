//! Stream inspection - ffprobe stream listing and aspect-ratio classification

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tubely_core::{AppError, AppResult, AspectRatio};

use crate::process::run_tool;

/// One stream reported by the media prober.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl StreamInfo {
    pub fn is_video(&self) -> bool {
        self.codec_type.as_deref() == Some("video")
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// Lists the streams of a local media file.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> AppResult<Vec<StreamInfo>>;
}

/// [`MediaProbe`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }
}

/// Decode ffprobe's `-print_format json -show_streams` output.
pub fn parse_probe_output(stdout: &[u8]) -> AppResult<Vec<StreamInfo>> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| AppError::ProbeFailure(format!("unreadable ffprobe output: {}", e)))?;
    Ok(parsed.streams)
}

#[async_trait]
impl MediaProbe for FfprobeInspector {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> AppResult<Vec<StreamInfo>> {
        let start = std::time::Instant::now();

        let args: [&OsStr; 6] = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ];
        let output = run_tool(&self.ffprobe_path, args, self.timeout)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "ffprobe failed"
                );
                AppError::ProbeFailure(e.to_string())
            })?;

        let streams = parse_probe_output(&output.stdout)?;

        tracing::debug!(
            stream_count = streams.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "ffprobe finished"
        );

        Ok(streams)
    }
}

/// Classifies a staged file by the dimensions of its primary stream.
#[derive(Clone)]
pub struct StreamInspector {
    probe: Arc<dyn MediaProbe>,
}

impl StreamInspector {
    pub fn new(probe: Arc<dyn MediaProbe>) -> Self {
        Self { probe }
    }

    /// Probe `path` and classify it.
    ///
    /// The first video stream decides; a file without one falls back to the
    /// first stream, whose missing dimensions classify as `other`.
    pub async fn inspect(&self, path: &Path) -> AppResult<AspectRatio> {
        let streams = self.probe.probe(path).await?;

        let primary = streams
            .iter()
            .find(|s| s.is_video())
            .or_else(|| streams.first())
            .ok_or_else(|| AppError::NoStreamsFound(path.display().to_string()))?;

        let width = primary.width.unwrap_or(0);
        let height = primary.height.unwrap_or(0);
        let aspect_ratio = AspectRatio::classify(width, height);

        tracing::info!(
            width,
            height,
            aspect_ratio = %aspect_ratio,
            "Video inspected"
        );

        Ok(aspect_ratio)
    }
}
