//! Video ingestion orchestration: stage → inspect → remux → upload → record.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncRead;
use uuid::Uuid;

use tubely_core::{
    AppError, AppResult, AspectRatio, IngestConfig, IngestState, Locator, MediaType, Video,
    VideoRepository,
};
use tubely_storage::{KeyAllocator, ObjectUploader};

use super::faststart::FastStartRemuxer;
use super::inspector::StreamInspector;
use crate::staging::{stage_upload, StagedFile};

/// Caller-supplied parameters of one ingestion.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub video_id: Uuid,
    /// Authenticated caller; must own the record.
    pub user_id: Uuid,
    /// Declared `Content-Type` of the upload body.
    pub content_type: String,
}

/// What a successful ingestion produced.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub video: Video,
    pub locator: Locator,
    pub aspect_ratio: AspectRatio,
}

/// Drives one upload through the ingestion pipeline.
///
/// Stages run strictly in order. Every local file created along the way is
/// owned by a [`StagedFile`] scoped to the run, so none outlives the call.
pub struct IngestionOrchestrator {
    repository: Arc<dyn VideoRepository>,
    inspector: StreamInspector,
    remuxer: Arc<dyn FastStartRemuxer>,
    keys: KeyAllocator,
    uploader: Arc<dyn ObjectUploader>,
    staging_dir: PathBuf,
    max_upload_bytes: u64,
}

impl IngestionOrchestrator {
    pub fn new(
        config: &IngestConfig,
        repository: Arc<dyn VideoRepository>,
        inspector: StreamInspector,
        remuxer: Arc<dyn FastStartRemuxer>,
        keys: KeyAllocator,
        uploader: Arc<dyn ObjectUploader>,
    ) -> Self {
        Self {
            repository,
            inspector,
            remuxer,
            keys,
            uploader,
            staging_dir: config.staging_dir(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Ingest `body` as the video content of `request.video_id`.
    ///
    /// Media type, record existence and ownership are checked before any byte
    /// is read from `body`.
    pub async fn ingest<R>(&self, request: IngestRequest, body: &mut R) -> AppResult<IngestOutcome>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let media_type = MediaType::parse_video(&request.content_type)?;

        let video = self
            .repository
            .get_video(request.video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

        if !video.is_owned_by(request.user_id) {
            return Err(AppError::NotAuthorized(format!(
                "user {} does not own video {}",
                request.user_id, request.video_id
            )));
        }

        tracing::info!(
            video_id = %video.id,
            user_id = %request.user_id,
            state = %IngestState::Received,
            "Starting video ingestion"
        );

        let video_id = video.id;
        let start = std::time::Instant::now();
        let result = self.run_pipeline(video, &media_type, body).await;

        match &result {
            Ok(outcome) => tracing::info!(
                video_id = %video_id,
                state = %IngestState::Recorded,
                locator = %outcome.locator,
                aspect_ratio = %outcome.aspect_ratio,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video ingestion completed"
            ),
            Err(e) => {
                let state = e
                    .stage()
                    .map(|stage| IngestState::Failed(stage).to_string())
                    .unwrap_or_else(|| "failed".to_string());
                tracing::error!(
                    video_id = %video_id,
                    state = %state,
                    error = %e.detailed_message(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Video ingestion failed"
                );
            }
        }

        result
    }

    async fn run_pipeline<R>(
        &self,
        mut video: Video,
        media_type: &MediaType,
        body: &mut R,
    ) -> AppResult<IngestOutcome>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let video_id = video.id;

        let staged = stage_upload(body, &self.staging_dir, self.max_upload_bytes).await?;
        transition(video_id, IngestState::Staged);

        let aspect_ratio = self.inspector.inspect(staged.path()).await?;
        transition(video_id, IngestState::Inspected);

        // Guard the output before the tool runs so partial output is removed too.
        let expected = StagedFile::adopt(self.remuxer.output_path(staged.path()));
        let remuxed_path = self.remuxer.remux(staged.path()).await?;
        let remuxed = if remuxed_path.as_path() == expected.path() {
            expected
        } else {
            StagedFile::adopt(remuxed_path)
        };
        staged.remove().await;
        transition(video_id, IngestState::Remuxed);

        let key = self.keys.allocate(aspect_ratio)?;
        self.uploader
            .upload_file(remuxed.path(), &key, media_type.as_str())
            .await?;
        remuxed.remove().await;
        transition(video_id, IngestState::Uploaded);

        let locator = Locator::new(self.uploader.bucket().to_string(), key);
        video.video_url = Some(locator.to_string());
        self.repository
            .update_video(&video)
            .await
            .map_err(|e| match e {
                AppError::RecordingFailure(_) => e,
                other => AppError::RecordingFailure(other.to_string()),
            })
            .inspect_err(|_| {
                tracing::warn!(
                    video_id = %video_id,
                    locator = %locator,
                    "Uploaded object is not referenced by any record"
                )
            })?;

        Ok(IngestOutcome {
            video,
            locator,
            aspect_ratio,
        })
    }
}

fn transition(video_id: Uuid, state: IngestState) {
    tracing::debug!(video_id = %video_id, state = %state, "Ingestion state changed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::inspector::{MediaProbe, StreamInfo};
    use async_trait::async_trait;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tokio::io::ReadBuf;
    use tubely_core::{EntropyError, InMemoryVideoRepository, OsRandom, RandomSource};
    use tubely_storage::{StorageError, StorageResult};

    struct FixedProbe {
        width: u32,
        height: u32,
    }

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn probe(&self, path: &Path) -> AppResult<Vec<StreamInfo>> {
            assert!(path.exists(), "probe must see the staged file");
            Ok(vec![StreamInfo {
                codec_type: Some("video".to_string()),
                width: Some(self.width),
                height: Some(self.height),
                ..Default::default()
            }])
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl MediaProbe for FailingProbe {
        async fn probe(&self, _path: &Path) -> AppResult<Vec<StreamInfo>> {
            Err(AppError::ProbeFailure("moov atom not found".to_string()))
        }
    }

    /// Copies the input to the fast-start path, as ffmpeg would.
    struct CopyRemuxer;

    #[async_trait]
    impl FastStartRemuxer for CopyRemuxer {
        async fn remux(&self, input: &Path) -> AppResult<PathBuf> {
            let out = self.output_path(input);
            tokio::fs::copy(input, &out).await?;
            Ok(out)
        }
    }

    /// Leaves partial output behind and then fails.
    struct PartialRemuxer;

    #[async_trait]
    impl FastStartRemuxer for PartialRemuxer {
        async fn remux(&self, input: &Path) -> AppResult<PathBuf> {
            tokio::fs::write(self.output_path(input), b"half").await?;
            Err(AppError::RemuxFailure("exit status: 1".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingUploader {
        uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
        bucket: Option<&'static str>,
        fail: bool,
    }

    #[async_trait]
    impl ObjectUploader for RecordingUploader {
        async fn upload_file(
            &self,
            local_path: &Path,
            key: &str,
            content_type: &str,
        ) -> StorageResult<()> {
            if self.fail {
                return Err(StorageError::UploadFailed("connection reset".to_string()));
            }
            let bytes = tokio::fs::read(local_path).await?;
            self.uploads
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string(), bytes));
            Ok(())
        }

        fn bucket(&self) -> &str {
            self.bucket.unwrap_or("tubely-videos")
        }
    }

    struct BrokenRandom;

    impl RandomSource for BrokenRandom {
        fn fill(&self, _buf: &mut [u8]) -> Result<(), EntropyError> {
            Err(EntropyError("getrandom failed".to_string()))
        }
    }

    /// Reads like the in-memory store but every write fails.
    struct ReadOnlyRepository(Arc<InMemoryVideoRepository>);

    #[async_trait]
    impl VideoRepository for ReadOnlyRepository {
        async fn get_video(&self, id: Uuid) -> AppResult<Option<Video>> {
            self.0.get_video(id).await
        }

        async fn update_video(&self, _video: &Video) -> AppResult<()> {
            Err(AppError::Config("database is read-only".to_string()))
        }
    }

    /// Yields `remaining` bytes, then fails like a dropped connection.
    struct TruncatedBody {
        remaining: usize,
    }

    impl AsyncRead for TruncatedBody {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "client went away",
                )));
            }
            let n = self.remaining.min(buf.remaining()).min(1024);
            buf.put_slice(&vec![7u8; n]);
            self.remaining -= n;
            Poll::Ready(Ok(()))
        }
    }

    struct Harness {
        dir: tempfile::TempDir,
        repository: Arc<InMemoryVideoRepository>,
        uploader: Arc<RecordingUploader>,
        orchestrator: IngestionOrchestrator,
        video: Video,
    }

    struct Parts {
        probe: Arc<dyn MediaProbe>,
        remuxer: Arc<dyn FastStartRemuxer>,
        random: Arc<dyn RandomSource>,
        uploader: RecordingUploader,
        read_only_records: bool,
        max_upload_bytes: u64,
    }

    impl Default for Parts {
        fn default() -> Self {
            Self {
                probe: Arc::new(FixedProbe {
                    width: 1920,
                    height: 1080,
                }),
                remuxer: Arc::new(CopyRemuxer),
                random: Arc::new(OsRandom),
                uploader: RecordingUploader::default(),
                read_only_records: false,
                max_upload_bytes: 1 << 20,
            }
        }
    }

    fn config(dir: &Path, max_upload_bytes: u64) -> IngestConfig {
        IngestConfig {
            s3_bucket: "tubely-videos".to_string(),
            s3_region: "us-east-2".to_string(),
            s3_endpoint: None,
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            process_timeout: Duration::from_secs(5),
            upload_timeout: Duration::from_secs(5),
            presign_ttl: Duration::from_secs(10),
            max_upload_bytes,
            staging_dir: Some(dir.to_path_buf()),
        }
    }

    async fn harness(parts: Parts) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(InMemoryVideoRepository::new());
        let video = Video::new(Uuid::new_v4(), "boots");
        repository.insert(video.clone()).await;
        let uploader = Arc::new(parts.uploader);
        let records: Arc<dyn VideoRepository> = if parts.read_only_records {
            Arc::new(ReadOnlyRepository(repository.clone()))
        } else {
            repository.clone()
        };

        let orchestrator = IngestionOrchestrator::new(
            &config(dir.path(), parts.max_upload_bytes),
            records,
            StreamInspector::new(parts.probe),
            parts.remuxer,
            KeyAllocator::new(parts.random),
            uploader.clone(),
        );

        Harness {
            dir,
            repository,
            uploader,
            orchestrator,
            video,
        }
    }

    impl Harness {
        fn request(&self) -> IngestRequest {
            IngestRequest {
                video_id: self.video.id,
                user_id: self.video.user_id,
                content_type: "video/mp4".to_string(),
            }
        }

        async fn run(&self, request: IngestRequest, body: &[u8]) -> AppResult<IngestOutcome> {
            let mut body = body;
            self.orchestrator.ingest(request, &mut body).await
        }

        fn staged_entries(&self) -> usize {
            std::fs::read_dir(self.dir.path()).unwrap().count()
        }
    }

    #[tokio::test]
    async fn test_ingest_records_locator() {
        let h = harness(Parts::default()).await;

        let outcome = h.run(h.request(), b"movie bytes").await.unwrap();

        assert_eq!(outcome.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(outcome.locator.bucket, "tubely-videos");
        assert!(outcome.locator.key.starts_with("landscape/"));

        let stored = h.repository.get_video(h.video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, Some(outcome.locator.to_string()));

        let uploads = h.uploader.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, outcome.locator.key);
        assert_eq!(uploads[0].1, "video/mp4");
        assert_eq!(uploads[0].2, b"movie bytes");
        drop(uploads);

        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_content_type_parameters_are_accepted() {
        let h = harness(Parts::default()).await;
        let mut request = h.request();
        request.content_type = "Video/MP4; codecs=\"avc1.42E01E\"".to_string();
        h.run(request, b"movie bytes").await.unwrap();
        assert_eq!(h.uploader.uploads.lock().unwrap()[0].1, "video/mp4");
    }

    #[tokio::test]
    async fn test_wrong_media_type_reads_nothing() {
        let h = harness(Parts::default()).await;
        let mut request = h.request();
        request.content_type = "image/png".to_string();

        let err = h.run(request, b"png bytes").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidMediaType(_)));
        assert_eq!(h.staged_entries(), 0);
        assert!(h.uploader.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let h = harness(Parts::default()).await;
        let mut request = h.request();
        request.video_id = Uuid::new_v4();
        let err = h.run(request, b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_other_owner_is_not_authorized() {
        let h = harness(Parts::default()).await;
        let mut request = h.request();
        request.user_id = Uuid::new_v4();

        let err = h.run(request, b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::NotAuthorized(_)));
        assert_eq!(h.staged_entries(), 0);

        let stored = h.repository.get_video(h.video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, None);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let h = harness(Parts {
            max_upload_bytes: 4,
            ..Default::default()
        })
        .await;
        let err = h.run(h.request(), b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { .. }));
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_cleans_up() {
        let h = harness(Parts {
            probe: Arc::new(FailingProbe),
            ..Default::default()
        })
        .await;
        let err = h.run(h.request(), b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::ProbeFailure(_)));
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_partial_remux_output_is_removed() {
        let h = harness(Parts {
            remuxer: Arc::new(PartialRemuxer),
            ..Default::default()
        })
        .await;
        let err = h.run(h.request(), b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::RemuxFailure(_)));
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_entropy_failure_stops_before_upload() {
        let h = harness(Parts {
            random: Arc::new(BrokenRandom),
            ..Default::default()
        })
        .await;
        let err = h.run(h.request(), b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::EntropyUnavailable(_)));
        assert!(h.uploader.uploads.lock().unwrap().is_empty());
        assert_eq!(h.staged_entries(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_record_untouched() {
        let h = harness(Parts {
            uploader: RecordingUploader {
                fail: true,
                ..Default::default()
            },
            ..Default::default()
        })
        .await;
        let err = h.run(h.request(), b"movie bytes").await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailure(_)));
        assert_eq!(h.staged_entries(), 0);

        let stored = h.repository.get_video(h.video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, None);
    }

    #[tokio::test]
    async fn test_portrait_key_prefix() {
        let h = harness(Parts {
            probe: Arc::new(FixedProbe {
                width: 1080,
                height: 1920,
            }),
            ..Default::default()
        })
        .await;
        let outcome = h.run(h.request(), b"movie bytes").await.unwrap();
        assert!(outcome.locator.key.starts_with("portrait/"));
    }

    #[tokio::test]
    async fn test_locator_names_uploader_bucket() {
        let h = harness(Parts {
            uploader: RecordingUploader {
                bucket: Some("tubely-archive"),
                ..Default::default()
            },
            ..Default::default()
        })
        .await;
        let outcome = h.run(h.request(), b"movie bytes").await.unwrap();
        assert_eq!(outcome.locator.bucket, "tubely-archive");

        let stored = h.repository.get_video(h.video.id).await.unwrap().unwrap();
        assert!(stored
            .video_url
            .unwrap()
            .starts_with("tubely-archive,landscape/"));
    }

    #[tokio::test]
    async fn test_record_failure_after_upload() {
        let h = harness(Parts {
            read_only_records: true,
            ..Default::default()
        })
        .await;
        let err = h.run(h.request(), b"movie bytes").await.unwrap_err();

        assert!(matches!(err, AppError::RecordingFailure(_)));
        assert_eq!(err.stage(), Some(tubely_core::IngestStage::Recording));
        assert!(err.to_string().contains("read-only"));
        assert_eq!(h.uploader.uploads.lock().unwrap().len(), 1);
        assert_eq!(h.staged_entries(), 0);

        let stored = h.repository.get_video(h.video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, None);
    }

    #[tokio::test]
    async fn test_body_read_error_mid_copy() {
        let h = harness(Parts::default()).await;
        let mut body = TruncatedBody { remaining: 4096 };

        let err = h
            .orchestrator
            .ingest(h.request(), &mut body)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StagingFailure(_)));
        assert_eq!(err.stage(), Some(tubely_core::IngestStage::Staging));
        assert!(err.detailed_message().contains("client went away"));
        assert!(h.uploader.uploads.lock().unwrap().is_empty());
        assert_eq!(h.staged_entries(), 0);
    }
}
