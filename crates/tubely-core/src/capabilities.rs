//! Clock and randomness capabilities.
//!
//! Key allocation and URL signing take these as injected dependencies so tests
//! can pin time and entropy.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::TryRngCore;

#[derive(Debug, thiserror::Error)]
#[error("random source failed: {0}")]
pub struct EntropyError(pub String);

/// Source of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `buf` completely or fail. A short read is a failure.
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError>;
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), EntropyError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| EntropyError(e.to_string()))
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
