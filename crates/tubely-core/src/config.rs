//! Configuration module
//!
//! Ingestion settings are read once at startup and injected into the storage
//! and processing components as an immutable value.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

// Common constants
const FFPROBE_PATH: &str = "ffprobe";
const FFMPEG_PATH: &str = "ffmpeg";
const PROCESS_TIMEOUT_SECS: u64 = 300;
const UPLOAD_TIMEOUT_SECS: u64 = 600;
const PRESIGN_TTL_SECS: u64 = 10;
const MAX_UPLOAD_SIZE_MB: u64 = 1024;
/// Longest expiry S3 accepts on a presigned request (seven days).
pub const MAX_PRESIGN_TTL_SECS: u64 = 604_800;

/// Ingestion and delivery configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    // Storage configuration
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    // External tools
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub process_timeout: Duration,
    // Upload and delivery
    pub upload_timeout: Duration,
    pub presign_ttl: Duration,
    pub max_upload_bytes: u64,
    pub staging_dir: Option<PathBuf>,
}

impl IngestConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secs = |name: &str, default: u64| {
            non_empty(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let s3_bucket = non_empty("S3_BUCKET")
            .ok_or_else(|| AppError::Config("S3_BUCKET must be set".to_string()))?;
        let s3_region = non_empty("S3_REGION")
            .or_else(|| non_empty("AWS_REGION"))
            .ok_or_else(|| AppError::Config("S3_REGION or AWS_REGION must be set".to_string()))?;

        let max_upload_mb = secs("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB);

        let config = IngestConfig {
            s3_bucket,
            s3_region,
            s3_endpoint: non_empty("S3_ENDPOINT"),
            ffprobe_path: non_empty("FFPROBE_PATH").unwrap_or_else(|| FFPROBE_PATH.to_string()),
            ffmpeg_path: non_empty("FFMPEG_PATH").unwrap_or_else(|| FFMPEG_PATH.to_string()),
            process_timeout: Duration::from_secs(secs("PROCESS_TIMEOUT_SECS", PROCESS_TIMEOUT_SECS)),
            upload_timeout: Duration::from_secs(secs("UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS)),
            presign_ttl: Duration::from_secs(secs("PRESIGN_TTL_SECS", PRESIGN_TTL_SECS)),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            staging_dir: non_empty("STAGING_DIR").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.s3_bucket.trim().is_empty() {
            return Err(AppError::Config("S3 bucket must not be empty".to_string()));
        }
        if self.presign_ttl.is_zero() || self.presign_ttl.as_secs() > MAX_PRESIGN_TTL_SECS {
            return Err(AppError::Config(format!(
                "PRESIGN_TTL_SECS must be between 1 and {}",
                MAX_PRESIGN_TTL_SECS
            )));
        }
        if self.process_timeout.is_zero() || self.upload_timeout.is_zero() {
            return Err(AppError::Config("Timeouts must be greater than zero".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(AppError::Config("MAX_UPLOAD_SIZE_MB must be greater than zero".to_string()));
        }
        for (name, path) in [("FFPROBE_PATH", &self.ffprobe_path), ("FFMPEG_PATH", &self.ffmpeg_path)] {
            validate_tool_path(path)
                .map_err(|reason| AppError::Config(format!("Invalid {}: {}", name, reason)))?;
        }
        Ok(())
    }

    /// Directory staged files are created in.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(env::temp_dir)
    }
}

/// Reject executable paths containing shell metacharacters or traversal.
fn validate_tool_path(path: &str) -> Result<(), String> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() {
        return Err("path is empty".to_string());
    }
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(format!("contains dangerous characters: {}", path));
    }
    if path.contains("..") {
        return Err(format!("contains directory traversal: {}", path));
    }
    Ok(())
}
