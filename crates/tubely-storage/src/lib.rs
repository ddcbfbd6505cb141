//! Tubely Storage Library
//!
//! Object-store plumbing for the ingestion pipeline: key allocation, file
//! uploads and presigned playback URLs (signed by `object_store`).
//!
//! # Storage key format
//!
//! Keys are namespaced by aspect-ratio bucket: `{landscape|portrait|other}/{token}`,
//! where `token` is 32 random bytes, base64url-encoded without padding. Keys are
//! never checked for collisions against the store.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-s3")]
pub use factory::create_storage;
pub use factory::StorageServices;
pub use keys::KeyAllocator;
#[cfg(feature = "storage-s3")]
pub use s3::{ObjectStoreUploader, S3Storage};
pub use traits::{ObjectUploader, StorageError, StorageResult, UrlSigner};
