//! Video metadata record store.
//!
//! The relational store lives outside this workspace; the pipeline only needs a
//! read-by-id and a single-row, last-write-wins update.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Video;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a video record by id.
    async fn get_video(&self, id: Uuid) -> AppResult<Option<Video>>;

    /// Overwrite the stored record. Store failures surface as
    /// [`AppError::RecordingFailure`].
    async fn update_video(&self, video: &Video) -> AppResult<()>;
}

/// Process-local record store used by the CLI and tests.
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get_video(&self, id: Uuid) -> AppResult<Option<Video>> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn update_video(&self, video: &Video) -> AppResult<()> {
        let mut videos = self.videos.write().await;
        let stored = videos
            .get_mut(&video.id)
            .ok_or_else(|| AppError::RecordingFailure(format!("no video with id {}", video.id)))?;
        *stored = video.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }
}
