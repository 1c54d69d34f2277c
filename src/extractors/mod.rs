use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TranscriptError;

lazy_static! {
    static ref BARE_VIDEO_ID: Regex = Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap();

    /// URL shapes in priority order; the first capture is the video id
    static ref URL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})").unwrap(),
        Regex::new(r"youtu\.be/([a-zA-Z0-9_-]{11})").unwrap(),
        Regex::new(r"youtube\.com/embed/([a-zA-Z0-9_-]{11})").unwrap(),
        Regex::new(r"youtube\.com/v/([a-zA-Z0-9_-]{11})").unwrap(),
    ];
}

/// Canonical 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        extract_video_id(s)
    }
}

/// Extract a video id from a bare id or one of the supported YouTube URL shapes.
///
/// A bare id is returned unchanged. Otherwise the input is searched for
/// `youtube.com/watch?v=`, `youtu.be/`, `youtube.com/embed/` and `youtube.com/v/`
/// in that order, and the first match wins.
pub fn extract_video_id(input: &str) -> Result<VideoId, TranscriptError> {
    if BARE_VIDEO_ID.is_match(input) {
        return Ok(VideoId(input.to_string()));
    }

    URL_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
        .ok_or_else(|| TranscriptError::InvalidIdentifier(input.to_string()))
}
