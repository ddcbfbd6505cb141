//! Storage key allocation.
//!
//! Key format: `{aspect_ratio}/{token}` with a 256-bit base64url token.

use base64::Engine;
use std::sync::Arc;
use tubely_core::{AspectRatio, RandomSource};

use crate::traits::{StorageError, StorageResult};

/// Number of random bytes in a key token.
pub const KEY_TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct KeyAllocator {
    random: Arc<dyn RandomSource>,
}

impl KeyAllocator {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Allocate a fresh key under the aspect-ratio namespace.
    ///
    /// Fails rather than emitting a short token if the random source errors.
    pub fn allocate(&self, aspect_ratio: AspectRatio) -> StorageResult<String> {
        let mut token = [0u8; KEY_TOKEN_BYTES];
        self.random
            .fill(&mut token)
            .map_err(|e| StorageError::EntropyUnavailable(e.to_string()))?;
        Ok(format!(
            "{}/{}",
            aspect_ratio,
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token)
        ))
    }
}
