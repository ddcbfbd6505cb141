use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::AppError;

/// A bare `type/subtype` media type, parameters stripped and lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType(String);

impl MediaType {
    pub const VIDEO_MP4: &'static str = "video/mp4";

    /// Parse a Content-Type header value such as `video/mp4; codecs="avc1"`.
    pub fn parse(content_type: &str) -> Result<Self, AppError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let valid = match essence.split_once('/') {
            Some((kind, subtype)) => {
                !kind.is_empty()
                    && !subtype.is_empty()
                    && !subtype.contains('/')
                    && essence.chars().all(|c| !c.is_whitespace())
            }
            None => false,
        };

        if !valid {
            return Err(AppError::InvalidMediaType(content_type.to_string()));
        }
        Ok(MediaType(essence))
    }

    /// Parse and require `video/mp4`.
    pub fn parse_video(content_type: &str) -> Result<Self, AppError> {
        let media_type = Self::parse(content_type)?;
        if media_type.as_str() != Self::VIDEO_MP4 {
            return Err(AppError::InvalidMediaType(media_type.0));
        }
        Ok(media_type)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
