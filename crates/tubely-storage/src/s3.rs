use crate::traits::{ObjectUploader, StorageError, StorageResult, UrlSigner};
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tubely_core::{Clock, MAX_PRESIGN_TTL_SECS};

/// S3 connection built from the environment plus explicit bucket settings.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    builder: AmazonS3Builder,
    clock: Arc<dyn Clock>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// Credentials are resolved from the environment (`AWS_ACCESS_KEY_ID`,
    /// profile, instance metadata), never passed in.
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> StorageResult<Self> {
        Self::from_builder(AmazonS3Builder::from_env(), bucket, region, endpoint_url, clock)
    }

    /// Same as [`S3Storage::new`], starting from a caller-prepared builder.
    pub fn from_builder(
        builder: AmazonS3Builder,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> StorageResult<Self> {
        let mut builder = builder.with_region(region.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .clone()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            builder,
            clock,
            bucket,
            region,
            endpoint_url,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    /// Uploader writing into this bucket, bounded by `timeout` per upload.
    pub fn uploader(&self, timeout: Duration) -> ObjectStoreUploader {
        ObjectStoreUploader::new(self.store.clone(), self.bucket.clone(), timeout)
    }

    /// Store for `bucket`; locators may name buckets other than the configured one.
    fn store_for(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        if bucket == self.bucket {
            return Ok(self.store.clone());
        }
        let store = self
            .builder
            .clone()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Ok(Arc::new(store))
    }
}

#[async_trait]
impl UrlSigner for S3Storage {
    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let expires_secs = expires_in.as_secs();
        if expires_secs == 0 || expires_secs > MAX_PRESIGN_TTL_SECS {
            return Err(StorageError::SigningFailed(format!(
                "expiry must be between 1 and {} seconds, got {:?}",
                MAX_PRESIGN_TTL_SECS, expires_in
            )));
        }
        if bucket.is_empty() || key.is_empty() {
            return Err(StorageError::InvalidKey(format!("{},{}", bucket, key)));
        }

        let location = ObjectPath::from(key.to_string());
        let url = self
            .store_for(bucket)?
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .to_string();

        let expires_at = chrono::Duration::from_std(expires_in)
            .ok()
            .map(|ttl| self.clock.now() + ttl);
        tracing::debug!(
            bucket = %bucket,
            key = %key,
            expires_secs,
            expires_at = ?expires_at,
            "Presigned URL generated"
        );

        Ok(url)
    }
}

/// Streams local files into any `object_store` backend.
///
/// Small files go up in a single PUT; files larger than the writer's buffer
/// switch to a multipart upload transparently.
#[derive(Clone)]
pub struct ObjectStoreUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    timeout: Duration,
}

impl ObjectStoreUploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, timeout: Duration) -> Self {
        Self {
            store,
            bucket,
            timeout,
        }
    }

    /// Copy `reader` to `location` within the upload deadline.
    ///
    /// On error or deadline the writer is aborted, so a multipart upload that
    /// already started is cancelled on the store.
    async fn put_reader<R>(
        &self,
        reader: &mut R,
        location: &ObjectPath,
        content_type: &str,
    ) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin + Send + ?Sized,
    {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );

        let mut writer =
            BufWriter::new(self.store.clone(), location.clone()).with_attributes(attributes);

        let transfer = async {
            let copied = tokio::io::copy(reader, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<u64, std::io::Error>(copied)
        };
        let outcome = tokio::time::timeout(self.timeout, transfer).await;

        let reason = match outcome {
            Ok(Ok(copied)) => return Ok(copied),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}s", self.timeout.as_secs()),
        };

        if let Err(e) = writer.abort().await {
            tracing::warn!(
                error = %e,
                location = %location,
                "Failed to abort S3 upload"
            );
        }
        Err(StorageError::UploadFailed(reason))
    }
}

#[async_trait]
impl ObjectUploader for ObjectStoreUploader {
    async fn upload_file(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let location = ObjectPath::from(key.to_string());
        let start = std::time::Instant::now();

        let mut file = tokio::fs::File::open(local_path).await?;
        let size = self
            .put_reader(&mut file, &location, content_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                e
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
