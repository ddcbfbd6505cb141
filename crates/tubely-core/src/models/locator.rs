//! Persisted reference to an uploaded object.
//!
//! Stored in a video's URL field as `<bucket>,<key>`. It never holds a playback
//! URL; the delivery path signs a fresh one from it on every read.

use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub bucket: String,
    pub key: String,
}

impl Locator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Split a stored URL field at its first comma.
    ///
    /// Returns `None` when there is no comma or the key part is empty; such values
    /// predate the locator format and are served as-is.
    pub fn parse(value: &str) -> Option<Self> {
        let (bucket, key) = value.split_once(',')?;
        if key.is_empty() {
            return None;
        }
        Some(Self::new(bucket, key))
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}
