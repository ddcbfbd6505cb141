//! Local staging of uploaded bytes.
//!
//! Every file the pipeline writes to disk is owned by a [`StagedFile`]. The
//! normal path removes it explicitly; dropping the guard removes it on early
//! return or cancellation.

use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tubely_core::{AppError, AppResult};

const STAGING_PREFIX: &str = "tubely-upload-";
const STAGING_SUFFIX: &str = ".mp4";

/// A local file deleted on drop.
///
/// The pipeline's normal path calls [`StagedFile::remove`] so deletion runs on
/// the async runtime; `Drop` only handles error paths and cancellation.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    /// Take ownership of an existing (or not yet created) path.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file without blocking the runtime.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }

    /// Release the file from cleanup and return its path.
    pub fn keep(mut self) -> PathBuf {
        self.removed = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        // Blocking, but only reached when the owning future bailed out early.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged file"
            ),
        }
    }
}

/// Copy `body` into a fresh file under `dir`, rejecting more than `limit` bytes.
pub async fn stage_upload<R>(body: &mut R, dir: &Path, limit: u64) -> AppResult<StagedFile>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let (file, path) = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(dir)
        .map_err(AppError::StagingFailure)?
        .keep()
        .map_err(|e| AppError::StagingFailure(e.error))?;
    let staged = StagedFile::adopt(path);

    let mut file = tokio::fs::File::from_std(file);
    // One byte past the limit is enough to tell an oversized body apart.
    let mut limited = body.take(limit.saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file)
        .await
        .map_err(AppError::StagingFailure)?;

    if written > limit {
        return Err(AppError::PayloadTooLarge {
            size: written,
            limit,
        });
    }

    file.flush().await.map_err(AppError::StagingFailure)?;
    file.sync_all().await.map_err(AppError::StagingFailure)?;
    drop(file);

    tracing::debug!(
        path = %staged.path().display(),
        size_bytes = written,
        "Upload staged"
    );

    Ok(staged)
}
