//! YouTube Transcript MCP - fetch YouTube transcripts as MCP tools
//!
//! This library extracts video identifiers from YouTube URLs, picks a transcript
//! according to a fixed language policy, and exposes the result as the
//! `get_transcript` and `get_video_language` tools over a stdio MCP server.

pub mod backend;
pub mod cli;
pub mod config;
pub mod extractors;
pub mod output;
pub mod server;
pub mod tools;
pub mod transcript;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use backend::{TranscriptBackend, TranscriptDescriptor, TranscriptList, TranscriptSegment, YoutubeBackend};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{extract_video_id, VideoId};
pub use server::McpServer;
pub use transcript::{
    describe_languages, get_transcript_result, select, LanguageSummary, SelectionFailure,
    SelectionResult, TranscriptPayload,
};

/// Result type used by the application glue
pub type Result<T> = anyhow::Result<T>;

/// Closed set of failure outcomes reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidIdentifier,
    TranscriptsDisabled,
    VideoUnavailable,
    NoTranscriptFound,
    NoLanguageMatch,
    BackendError,
}

/// Error types specific to transcript retrieval
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Could not extract video ID from: {0}")]
    InvalidIdentifier(String),

    #[error("Transcripts are disabled for this video")]
    TranscriptsDisabled(String),

    #[error("Video is unavailable")]
    VideoUnavailable(String),

    #[error("No transcripts found for this video")]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
    },

    #[error("Language '{requested}' not available. Available: {}", .available.join(", "))]
    NoLanguageMatch {
        requested: String,
        available: Vec<String>,
    },

    #[error("{0}")]
    Backend(String),
}

impl TranscriptError {
    /// Taxonomy member this error is reported as
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscriptError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            TranscriptError::TranscriptsDisabled(_) => ErrorKind::TranscriptsDisabled,
            TranscriptError::VideoUnavailable(_) => ErrorKind::VideoUnavailable,
            TranscriptError::NoTranscriptFound { .. } => ErrorKind::NoTranscriptFound,
            TranscriptError::NoLanguageMatch { .. } => ErrorKind::NoLanguageMatch,
            TranscriptError::Backend(_) => ErrorKind::BackendError,
        }
    }
}

impl From<reqwest::Error> for TranscriptError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for TranscriptError {
    fn from(err: serde_json::Error) -> Self {
        TranscriptError::Backend(format!("Malformed response from YouTube: {}", err))
    }
}
