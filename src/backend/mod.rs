use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

pub use youtube::YoutubeBackend;

use crate::extractors::VideoId;
use crate::TranscriptError;

/// Result type returned by transcript backends
pub type BackendResult<T> = std::result::Result<T, TranscriptError>;

/// One caption unit as delivered by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// A transcript a video exposes, as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptDescriptor {
    pub video_id: VideoId,

    /// Language code, e.g. `en` or `pt-BR`
    pub language_code: String,

    /// Human-readable language name
    pub language: String,

    /// Machine-generated (ASR) rather than manually authored
    pub is_generated: bool,

    /// Backend-specific location of the caption data
    #[serde(skip)]
    locator: String,
}

impl TranscriptDescriptor {
    pub fn new(
        video_id: VideoId,
        language_code: impl Into<String>,
        language: impl Into<String>,
        is_generated: bool,
    ) -> Self {
        Self {
            video_id,
            language_code: language_code.into(),
            language: language.into(),
            is_generated,
            locator: String::new(),
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = locator.into();
        self
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// All transcripts a video exposes, in backend order
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptList {
    video_id: VideoId,
    transcripts: Vec<TranscriptDescriptor>,
}

impl TranscriptList {
    pub fn new(video_id: VideoId, transcripts: Vec<TranscriptDescriptor>) -> Self {
        Self {
            video_id,
            transcripts,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranscriptDescriptor> {
        self.transcripts.iter()
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    /// Language codes of every listed transcript, duplicates included
    pub fn language_codes(&self) -> Vec<String> {
        self.transcripts
            .iter()
            .map(|t| t.language_code.clone())
            .collect()
    }

    /// Find a transcript for the first matching language code, preferring
    /// manually created transcripts over generated ones for the same code.
    pub fn find_transcript<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> BackendResult<&TranscriptDescriptor> {
        self.find(language_codes, &[false, true])
    }

    pub fn find_manually_created_transcript<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> BackendResult<&TranscriptDescriptor> {
        self.find(language_codes, &[false])
    }

    pub fn find_generated_transcript<S: AsRef<str>>(
        &self,
        language_codes: &[S],
    ) -> BackendResult<&TranscriptDescriptor> {
        self.find(language_codes, &[true])
    }

    fn find<S: AsRef<str>>(
        &self,
        language_codes: &[S],
        generated_order: &[bool],
    ) -> BackendResult<&TranscriptDescriptor> {
        for code in language_codes {
            for &generated in generated_order {
                let found = self
                    .transcripts
                    .iter()
                    .find(|t| t.is_generated == generated && t.language_code == code.as_ref());
                if let Some(transcript) = found {
                    return Ok(transcript);
                }
            }
        }

        Err(TranscriptError::NoTranscriptFound {
            video_id: self.video_id.to_string(),
            requested: language_codes
                .iter()
                .map(|code| code.as_ref().to_string())
                .collect(),
        })
    }
}

impl<'a> IntoIterator for &'a TranscriptList {
    type Item = &'a TranscriptDescriptor;
    type IntoIter = std::slice::Iter<'a, TranscriptDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.transcripts.iter()
    }
}

/// Source of transcript listings and caption data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptBackend: Send + Sync {
    /// List every transcript available for a video
    async fn list(&self, video_id: &VideoId) -> BackendResult<TranscriptList>;

    /// Fetch the caption segments of a listed transcript, in order
    async fn fetch(&self, transcript: &TranscriptDescriptor) -> BackendResult<Vec<TranscriptSegment>>;
}


#[cfg(test)]
mod tests {
    use super::test_support::listing;
    use super::*;

    #[test]
    fn test_language_codes_preserve_order_and_duplicates() {
        let list = listing(&[("en", "English", false), ("ko", "Korean", true), ("en", "English (auto)", true)]);
        assert_eq!(list.language_codes(), vec!["en", "ko", "en"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_find_transcript_prefers_manual_for_same_code() {
        let list = listing(&[("en", "English (auto)", true), ("en", "English", false)]);
        let found = list.find_transcript(&["en"]).unwrap();
        assert!(!found.is_generated);
    }

    #[test]
    fn test_find_transcript_follows_requested_code_order() {
        let list = listing(&[("en", "English", false), ("de", "German", true)]);
        let found = list.find_transcript(&["de", "en"]).unwrap();
        assert_eq!(found.language_code, "de");
    }

    #[test]
    fn test_find_by_kind() {
        let list = listing(&[("en", "English", true), ("ko", "Korean", false)]);
        let codes = list.language_codes();

        assert_eq!(list.find_manually_created_transcript(&codes).unwrap().language_code, "ko");
        assert_eq!(list.find_generated_transcript(&codes).unwrap().language_code, "en");
    }

    #[test]
    fn test_find_without_match() {
        let list = listing(&[("en", "English", true)]);
        let err = list.find_manually_created_transcript(&["en"]).unwrap_err();
        assert!(matches!(err, TranscriptError::NoTranscriptFound { ref requested, .. } if requested == &["en"]));

        let empty = listing(&[]);
        let codes: Vec<String> = Vec::new();
        assert!(empty.find_generated_transcript(&codes).is_err());
    }
}
