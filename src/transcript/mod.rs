use serde::{Serialize, Serializer};

pub mod summary;

pub use summary::{describe_languages, LanguageSummary};

use crate::backend::{BackendResult, TranscriptBackend, TranscriptSegment};
use crate::extractors::{extract_video_id, VideoId};
use crate::{ErrorKind, TranscriptError};

/// A fetched transcript with its selection metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptPayload {
    pub video_id: VideoId,

    /// Language code of the chosen transcript
    pub language: String,

    pub is_generated: bool,

    /// Segments exactly as the backend returned them
    pub segments: Vec<TranscriptSegment>,

    /// Segment texts joined by single spaces
    pub full_text: String,

    /// Language codes of every listed transcript, in backend order
    pub available_languages: Vec<String>,
}

/// Why a transcript could not be returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionFailure {
    pub kind: ErrorKind,

    #[serde(rename = "error")]
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_languages: Option<Vec<String>>,
}

impl From<TranscriptError> for SelectionFailure {
    fn from(err: TranscriptError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        let available_languages = match err {
            TranscriptError::NoLanguageMatch { available, .. } => Some(available),
            _ => None,
        };

        Self {
            kind,
            message,
            available_languages,
        }
    }
}

/// Outcome of a transcript request
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionResult {
    Success(TranscriptPayload),
    Failure(SelectionFailure),
}

impl SelectionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SelectionResult::Success(_))
    }

    pub fn payload(&self) -> Option<&TranscriptPayload> {
        match self {
            SelectionResult::Success(payload) => Some(payload),
            SelectionResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SelectionFailure> {
        match self {
            SelectionResult::Success(_) => None,
            SelectionResult::Failure(failure) => Some(failure),
        }
    }

    /// Tool-facing text: the full transcript, or `Error: <message>`
    pub fn into_text(self) -> String {
        match self {
            SelectionResult::Success(payload) => payload.full_text,
            SelectionResult::Failure(failure) => format!("Error: {}", failure.message),
        }
    }
}

impl From<TranscriptError> for SelectionResult {
    fn from(err: TranscriptError) -> Self {
        SelectionResult::Failure(err.into())
    }
}

impl Serialize for SelectionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, T> {
            success: bool,
            #[serde(flatten)]
            inner: &'a T,
        }

        match self {
            SelectionResult::Success(payload) => Tagged {
                success: true,
                inner: payload,
            }
            .serialize(serializer),
            SelectionResult::Failure(failure) => Tagged {
                success: false,
                inner: failure,
            }
            .serialize(serializer),
        }
    }
}

/// Extract the video id and select its transcript.
///
/// Never fails: an unrecognizable input is reported as an `InvalidIdentifier` failure.
pub async fn get_transcript_result<B>(
    backend: &B,
    url_or_id: &str,
    requested_lang: Option<&str>,
) -> SelectionResult
where
    B: TranscriptBackend + ?Sized,
{
    match extract_video_id(url_or_id) {
        Ok(video_id) => select(backend, &video_id, requested_lang).await,
        Err(err) => err.into(),
    }
}

/// Pick, fetch and assemble the transcript for a video.
///
/// With a requested language only an exact language-code match is accepted.
/// Without one, the first manually created transcript wins, then the first
/// generated one. Backend errors are converted into failures.
pub async fn select<B>(
    backend: &B,
    video_id: &VideoId,
    requested_lang: Option<&str>,
) -> SelectionResult
where
    B: TranscriptBackend + ?Sized,
{
    match select_transcript(backend, video_id, requested_lang).await {
        Ok(payload) => {
            tracing::info!(
                "Selected {} transcript ({}) for {} with {} segments",
                payload.language,
                if payload.is_generated { "generated" } else { "manual" },
                video_id,
                payload.segments.len()
            );
            SelectionResult::Success(payload)
        }
        Err(err) => {
            tracing::warn!("Transcript selection failed for {}: {}", video_id, err);
            err.into()
        }
    }
}

async fn select_transcript<B>(
    backend: &B,
    video_id: &VideoId,
    requested_lang: Option<&str>,
) -> BackendResult<TranscriptPayload>
where
    B: TranscriptBackend + ?Sized,
{
    let transcripts = backend.list(video_id).await?;
    let available_languages = transcripts.language_codes();

    let chosen = match requested_lang {
        Some(lang) => transcripts
            .find_transcript(&[lang])
            .map_err(|_| TranscriptError::NoLanguageMatch {
                requested: lang.to_string(),
                available: available_languages.clone(),
            })?,
        None => transcripts
            .find_manually_created_transcript(&available_languages)
            .or_else(|_| transcripts.find_generated_transcript(&available_languages))?,
    };

    let segments = backend.fetch(chosen).await?;
    let full_text = join_segment_text(&segments);

    Ok(TranscriptPayload {
        video_id: video_id.clone(),
        language: chosen.language_code.clone(),
        is_generated: chosen.is_generated,
        segments,
        full_text,
        available_languages,
    })
}

/// Join segment texts with single spaces, in order
pub fn join_segment_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::{listing, video_id};
    use crate::backend::MockTranscriptBackend;

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new("Hello", 0.0, 1.5),
            TranscriptSegment::new(" there ", 1.5, 2.0),
            TranscriptSegment::new("world", 3.5, 1.0),
        ]
    }

    fn backend_with(entries: &'static [(&'static str, &'static str, bool)]) -> MockTranscriptBackend {
        let mut backend = MockTranscriptBackend::new();
        backend
            .expect_list()
            .returning(move |_| Ok(listing(entries)));
        backend
            .expect_fetch()
            .returning(|_| Ok(segments()));
        backend
    }

    #[tokio::test]
    async fn test_generated_only_picks_first_generated() {
        let backend = backend_with(&[("en", "English (auto-generated)", true), ("ko", "Korean (auto-generated)", true)]);

        let result = select(&backend, &video_id(), None).await;
        let payload = result.payload().unwrap();
        assert_eq!(payload.language, "en");
        assert!(payload.is_generated);
        assert_eq!(payload.available_languages, vec!["en", "ko"]);
    }

    #[tokio::test]
    async fn test_manual_preferred_over_generated() {
        let backend = backend_with(&[("en", "English (auto-generated)", true), ("ko", "Korean", false)]);

        let result = select(&backend, &video_id(), None).await;
        let payload = result.payload().unwrap();
        assert_eq!(payload.language, "ko");
        assert!(!payload.is_generated);
        assert_eq!(payload.available_languages, vec!["en", "ko"]);
    }

    #[tokio::test]
    async fn test_requested_language_is_used() {
        let backend = backend_with(&[("en", "English", false), ("ko", "Korean (auto-generated)", true)]);

        let result = select(&backend, &video_id(), Some("ko")).await;
        let payload = result.payload().unwrap();
        assert_eq!(payload.language, "ko");
        assert!(payload.is_generated);
    }

    #[tokio::test]
    async fn test_requested_language_missing() {
        let mut backend = MockTranscriptBackend::new();
        backend
            .expect_list()
            .returning(|_| Ok(listing(&[("en", "English", false), ("ko", "Korean", true)])));
        backend.expect_fetch().never();

        let result = select(&backend, &video_id(), Some("fr")).await;
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::NoLanguageMatch);
        assert_eq!(failure.message, "Language 'fr' not available. Available: en, ko");
        assert_eq!(
            failure.available_languages,
            Some(vec!["en".to_string(), "ko".to_string()])
        );
    }

    #[tokio::test]
    async fn test_no_transcripts() {
        let mut backend = MockTranscriptBackend::new();
        backend.expect_list().returning(|_| Ok(listing(&[])));
        backend.expect_fetch().never();

        let result = select(&backend, &video_id(), None).await;
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::NoTranscriptFound);
        assert_eq!(failure.message, "No transcripts found for this video");
        assert_eq!(failure.available_languages, None);
    }

    #[tokio::test]
    async fn test_listing_errors_map_to_failures() {
        let cases = [
            (TranscriptError::TranscriptsDisabled("x".into()), ErrorKind::TranscriptsDisabled, "Transcripts are disabled for this video"),
            (TranscriptError::VideoUnavailable("x".into()), ErrorKind::VideoUnavailable, "Video is unavailable"),
            (TranscriptError::Backend("boom".into()), ErrorKind::BackendError, "boom"),
        ];

        for (err, kind, message) in cases {
            let mut backend = MockTranscriptBackend::new();
            backend.expect_list().return_once(move |_| Err(err));

            let result = select(&backend, &video_id(), None).await;
            let failure = result.failure().unwrap();
            assert_eq!(failure.kind, kind);
            assert_eq!(failure.message, message);
            assert_eq!(failure.available_languages, None);
        }
    }

    #[tokio::test]
    async fn test_fetch_disappearance_is_not_replaced() {
        let mut backend = MockTranscriptBackend::new();
        backend
            .expect_list()
            .returning(|_| Ok(listing(&[("ko", "Korean", false), ("en", "English", true)])));
        backend
            .expect_fetch()
            .times(1)
            .returning(|transcript| {
                Err(TranscriptError::NoTranscriptFound {
                    video_id: transcript.video_id.to_string(),
                    requested: vec![transcript.language_code.clone()],
                })
            });

        let result = select(&backend, &video_id(), None).await;
        assert_eq!(result.failure().unwrap().kind, ErrorKind::NoTranscriptFound);
    }

    #[tokio::test]
    async fn test_full_text_joins_segments_in_order() {
        let backend = backend_with(&[("en", "English", false)]);

        let result = select(&backend, &video_id(), None).await;
        let payload = result.payload().unwrap();
        assert_eq!(payload.full_text, "Hello  there  world");
        assert_eq!(payload.segments, segments());
    }

    #[tokio::test]
    async fn test_invalid_identifier_is_a_failure() {
        let mut backend = MockTranscriptBackend::new();
        backend.expect_list().never();

        let result = get_transcript_result(&backend, "not a valid url", None).await;
        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::InvalidIdentifier);
        assert_eq!(result.into_text(), "Error: Could not extract video ID from: not a valid url");
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let backend = backend_with(&[("en", "English", false)]);
        let result = get_transcript_result(&backend, "https://youtu.be/dQw4w9WgXcQ", None).await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["video_id"], "dQw4w9WgXcQ");
        assert_eq!(value["language"], "en");
        assert_eq!(value["segments"][1]["start"], 1.5);

        let failure: SelectionResult = TranscriptError::VideoUnavailable("x".into()).into();
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Video is unavailable");
        assert_eq!(value["kind"], "VideoUnavailable");
        assert!(value.get("available_languages").is_none());
    }

    #[test]
    fn test_join_segment_text_empty() {
        assert_eq!(join_segment_text(&[]), "");
    }
}
