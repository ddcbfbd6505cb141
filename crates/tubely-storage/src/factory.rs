use crate::traits::{ObjectUploader, UrlSigner};
use std::sync::Arc;

#[cfg(feature = "storage-s3")]
use crate::{S3Storage, StorageResult};
#[cfg(feature = "storage-s3")]
use tubely_core::{Clock, IngestConfig};

/// The two object-store seams the pipeline consumes.
#[derive(Clone)]
pub struct StorageServices {
    pub uploader: Arc<dyn ObjectUploader>,
    pub signer: Arc<dyn UrlSigner>,
}

/// Create the S3 uploader and presigner from configuration.
///
/// Both share one store and its ambient credential provider.
#[cfg(feature = "storage-s3")]
pub fn create_storage(
    config: &IngestConfig,
    clock: Arc<dyn Clock>,
) -> StorageResult<StorageServices> {
    let storage = S3Storage::new(
        config.s3_bucket.clone(),
        config.s3_region.clone(),
        config.s3_endpoint.clone(),
        clock,
    )?;

    tracing::debug!(
        bucket = %storage.bucket(),
        region = %storage.region(),
        endpoint = ?storage.endpoint_url(),
        "S3 storage configured"
    );

    let uploader = Arc::new(storage.uploader(config.upload_timeout));
    Ok(StorageServices {
        uploader,
        signer: Arc::new(storage),
    })
}
