use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

const LANDSCAPE_MIN: f64 = 1.7;
const LANDSCAPE_MAX: f64 = 1.85;
const PORTRAIT_MIN: f64 = 0.5;
const PORTRAIT_MAX: f64 = 0.6;

/// Aspect-ratio bucket of a video's primary stream. Used as the storage key
/// namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    /// Classify `width / height` against the open 16:9 and 9:16 bands.
    ///
    /// The bands are deliberately narrow: anything outside `(1.7, 1.85)` and
    /// `(0.5, 0.6)`, including the band edges themselves, is [`AspectRatio::Other`].
    /// A zero height also lands in `Other`.
    pub fn classify(width: u32, height: u32) -> Self {
        if height == 0 {
            return AspectRatio::Other;
        }
        let ratio = f64::from(width) / f64::from(height);
        if ratio > LANDSCAPE_MIN && ratio < LANDSCAPE_MAX {
            AspectRatio::Landscape
        } else if ratio > PORTRAIT_MIN && ratio < PORTRAIT_MAX {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
