//! Storage abstraction traits
//!
//! The pipeline talks to the object store through two narrow seams: one that
//! writes a local file under a key, and one that mints presigned GET URLs.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tubely_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UploadFailed(msg) | StorageError::InvalidKey(msg) => {
                AppError::UploadFailure(msg)
            }
            StorageError::IoError(e) => AppError::UploadFailure(e.to_string()),
            StorageError::SigningFailed(msg) => AppError::SigningFailure(msg),
            StorageError::EntropyUnavailable(msg) => AppError::EntropyUnavailable(msg),
            StorageError::ConfigError(msg) => AppError::Config(msg),
        }
    }
}

/// Writes staged files to the object store.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Upload the full contents of `local_path` under `key`, declaring
    /// `content_type`. Single attempt; no retries.
    async fn upload_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Bucket this uploader writes into.
    fn bucket(&self) -> &str;
}

/// Mints time-limited read URLs.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Generate a presigned GET URL for `bucket`/`key` valid for `expires_in`
    /// from now.
    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
