//! Error types module
//!
//! Every failure the ingestion pipeline and the delivery path can produce is a
//! variant of [`AppError`]. Precondition failures are client faults; stage
//! failures are server faults and carry the stage they aborted in.

use std::io;

use crate::models::IngestStage;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_FAILURE")
    fn error_code(&self) -> &'static str;

    /// Whether the caller caused the failure
    fn is_client_fault(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to stage upload: {0}")]
    StagingFailure(#[source] io::Error),

    #[error("Media probe failed: {0}")]
    ProbeFailure(String),

    #[error("No streams found in {0}")]
    NoStreamsFound(String),

    #[error("Fast-start remux failed: {0}")]
    RemuxFailure(String),

    #[error("Random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Upload failed: {0}")]
    UploadFailure(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Failed to record video: {0}")]
    RecordingFailure(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Invalid media type: {0}")]
    InvalidMediaType(String),

    #[error("Upload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::StagingFailure(err)
    }
}

/// Static metadata for each variant: (http_status, error_code, client_fault, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::StagingFailure(_) => (500, "STAGING_FAILURE", false, LogLevel::Error),
        AppError::ProbeFailure(_) => (500, "PROBE_FAILURE", false, LogLevel::Error),
        AppError::NoStreamsFound(_) => (500, "NO_STREAMS_FOUND", false, LogLevel::Error),
        AppError::RemuxFailure(_) => (500, "REMUX_FAILURE", false, LogLevel::Error),
        AppError::EntropyUnavailable(_) => (500, "ENTROPY_UNAVAILABLE", false, LogLevel::Error),
        AppError::UploadFailure(_) => (500, "UPLOAD_FAILURE", false, LogLevel::Error),
        AppError::SigningFailure(_) => (500, "SIGNING_FAILURE", false, LogLevel::Error),
        AppError::RecordingFailure(_) => (500, "RECORDING_FAILURE", false, LogLevel::Error),
        AppError::NotAuthenticated => (401, "NOT_AUTHENTICATED", true, LogLevel::Debug),
        AppError::NotAuthorized(_) => (401, "NOT_AUTHORIZED", true, LogLevel::Debug),
        AppError::InvalidMediaType(_) => (400, "INVALID_MEDIA_TYPE", true, LogLevel::Debug),
        AppError::PayloadTooLarge { .. } => (413, "PAYLOAD_TOO_LARGE", true, LogLevel::Warn),
        AppError::NotFound(_) => (404, "NOT_FOUND", true, LogLevel::Debug),
        AppError::Config(_) => (500, "CONFIG_ERROR", false, LogLevel::Error),
    }
}

impl AppError {
    /// The pipeline stage this error aborted, or `None` for precondition and
    /// configuration failures.
    pub fn stage(&self) -> Option<IngestStage> {
        match self {
            AppError::StagingFailure(_) | AppError::PayloadTooLarge { .. } => {
                Some(IngestStage::Staging)
            }
            AppError::ProbeFailure(_) | AppError::NoStreamsFound(_) => {
                Some(IngestStage::Inspection)
            }
            AppError::RemuxFailure(_) => Some(IngestStage::Remux),
            AppError::EntropyUnavailable(_) | AppError::UploadFailure(_) => {
                Some(IngestStage::Upload)
            }
            AppError::RecordingFailure(_) => Some(IngestStage::Recording),
            AppError::SigningFailure(_)
            | AppError::NotAuthenticated
            | AppError::NotAuthorized(_)
            | AppError::InvalidMediaType(_)
            | AppError::NotFound(_)
            | AppError::Config(_) => None,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_client_fault(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotAuthenticated => "Couldn't validate credentials".to_string(),
            AppError::NotAuthorized(_) => "Not authorized to update this video".to_string(),
            AppError::InvalidMediaType(ref media_type) => {
                format!("Invalid media type {}, needs video/mp4", media_type)
            }
            AppError::PayloadTooLarge { limit, .. } => {
                format!("Upload exceeds the {} byte limit", limit)
            }
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::StagingFailure(_)
            | AppError::ProbeFailure(_)
            | AppError::NoStreamsFound(_)
            | AppError::RemuxFailure(_) => "Failed to process video".to_string(),
            AppError::EntropyUnavailable(_) | AppError::UploadFailure(_) => {
                "Failed to upload video".to_string()
            }
            AppError::SigningFailure(_) => "Failed to generate video URL".to_string(),
            AppError::RecordingFailure(_) => "Couldn't update video".to_string(),
            AppError::Config(_) => "Internal server error".to_string(),
        }
    }
}
