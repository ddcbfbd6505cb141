//! Delivery: swap stored locators for short-lived playback URLs.

use std::sync::Arc;
use std::time::Duration;
use tubely_core::{AppError, AppResult, Video};
use tubely_storage::UrlSigner;

/// Lifetime of a playback URL handed to clients.
pub const DEFAULT_PLAYBACK_TTL: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct DeliveryResolver {
    signer: Arc<dyn UrlSigner>,
    ttl: Duration,
}

impl DeliveryResolver {
    pub fn new(signer: Arc<dyn UrlSigner>, ttl: Duration) -> Self {
        Self { signer, ttl }
    }

    /// Replace the record's locator with a presigned URL.
    ///
    /// Records without a parseable `bucket,key` locator (no URL yet, or a value
    /// in an older format) are returned unchanged. Signing errors are not
    /// swallowed.
    pub async fn resolve(&self, mut video: Video) -> AppResult<Video> {
        let Some(locator) = video.locator() else {
            return Ok(video);
        };

        let url = self
            .signer
            .presigned_get_url(&locator.bucket, &locator.key, self.ttl)
            .await
            .map_err(|e| AppError::SigningFailure(e.to_string()))?;

        tracing::debug!(
            video_id = %video.id,
            bucket = %locator.bucket,
            key = %locator.key,
            ttl_secs = self.ttl.as_secs(),
            "Resolved playback URL"
        );

        video.video_url = Some(url);
        Ok(video)
    }

    /// Resolve a listing; the first signing failure fails the whole batch.
    pub async fn resolve_all(&self, videos: Vec<Video>) -> AppResult<Vec<Video>> {
        let mut resolved = Vec::with_capacity(videos.len());
        for video in videos {
            resolved.push(self.resolve(video).await?);
        }
        Ok(resolved)
    }
}
