use anyhow::bail;
use std::sync::Arc;
use std::time::Duration;
use tubely_core::{IngestConfig, OsRandom, VideoRepository, MAX_PRESIGN_TTL_SECS};
use tubely_processing::{
    DeliveryResolver, FfmpegRemuxer, FfprobeInspector, IngestionOrchestrator, StreamInspector,
};
use tubely_storage::{KeyAllocator, StorageServices};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Inspector running the configured ffprobe.
pub fn stream_inspector(config: &IngestConfig) -> StreamInspector {
    StreamInspector::new(Arc::new(FfprobeInspector::new(
        config.ffprobe_path.clone(),
        config.process_timeout,
    )))
}

pub fn remuxer(config: &IngestConfig) -> FfmpegRemuxer {
    FfmpegRemuxer::new(config.ffmpeg_path.clone(), config.process_timeout)
}

/// Wire the production pipeline: ffprobe, ffmpeg, OS randomness, S3 upload.
pub fn ingestion_orchestrator(
    config: &IngestConfig,
    repository: Arc<dyn VideoRepository>,
    storage: &StorageServices,
) -> IngestionOrchestrator {
    IngestionOrchestrator::new(
        config,
        repository,
        stream_inspector(config),
        Arc::new(remuxer(config)),
        KeyAllocator::new(Arc::new(OsRandom)),
        storage.uploader.clone(),
    )
}

pub fn delivery_resolver(config: &IngestConfig, storage: &StorageServices) -> DeliveryResolver {
    DeliveryResolver::new(storage.signer.clone(), config.presign_ttl)
}

/// Validate a `--ttl-secs` argument.
pub fn ttl_from_secs(secs: u64) -> anyhow::Result<Duration> {
    if secs == 0 || secs > MAX_PRESIGN_TTL_SECS {
        bail!("TTL must be between 1 and {} seconds", MAX_PRESIGN_TTL_SECS);
    }
    Ok(Duration::from_secs(secs))
}
