use serde::Serialize;
use std::fmt;

use crate::backend::{BackendResult, TranscriptBackend, TranscriptDescriptor, TranscriptList};
use crate::extractors::VideoId;

/// Transcript languages of a video, split by authorship
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageSummary {
    pub video_id: VideoId,

    /// Manually created transcripts as `code (name)`
    pub manual: Vec<String>,

    /// Generated transcripts as `code (name)`
    pub generated: Vec<String>,
}

impl LanguageSummary {
    pub fn from_list(list: &TranscriptList) -> Self {
        let (generated, manual): (Vec<_>, Vec<_>) = list.iter().partition(|t| t.is_generated);
        let label = |t: &&TranscriptDescriptor| format!("{} ({})", t.language_code, t.language);

        Self {
            video_id: list.video_id().clone(),
            manual: manual.iter().map(label).collect(),
            generated: generated.iter().map(label).collect(),
        }
    }
}

impl fmt::Display for LanguageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Video ID: {}", self.video_id)?;
        if !self.manual.is_empty() {
            write!(f, "\nManual subtitles: {}", self.manual.join(", "))?;
        }
        // Generated tracks carry the spoken language of the video
        if !self.generated.is_empty() {
            write!(f, "\nOriginal language: {}", self.generated.join(", "))?;
        }
        Ok(())
    }
}

/// List a video's transcripts and group their languages
pub async fn describe_languages<B>(backend: &B, video_id: &VideoId) -> BackendResult<LanguageSummary>
where
    B: TranscriptBackend + ?Sized,
{
    let list = backend.list(video_id).await?;
    Ok(LanguageSummary::from_list(&list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::{listing, video_id};
    use crate::backend::MockTranscriptBackend;
    use crate::TranscriptError;

    #[test]
    fn test_both_categories() {
        let list = listing(&[
            ("ko", "Korean", false),
            ("en", "English", false),
            ("ko", "Korean (auto-generated)", true),
        ]);

        let summary = LanguageSummary::from_list(&list);
        assert_eq!(
            summary.to_string(),
            "Video ID: dQw4w9WgXcQ\nManual subtitles: ko (Korean), en (English)\nOriginal language: ko (Korean (auto-generated))"
        );
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let generated_only = LanguageSummary::from_list(&listing(&[("en", "English (auto-generated)", true)]));
        assert_eq!(
            generated_only.to_string(),
            "Video ID: dQw4w9WgXcQ\nOriginal language: en (English (auto-generated))"
        );

        let manual_only = LanguageSummary::from_list(&listing(&[("de", "German", false)]));
        assert_eq!(manual_only.to_string(), "Video ID: dQw4w9WgXcQ\nManual subtitles: de (German)");

        let none = LanguageSummary::from_list(&listing(&[]));
        assert_eq!(none.to_string(), "Video ID: dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn test_describe_languages_propagates_errors() {
        let mut backend = MockTranscriptBackend::new();
        backend
            .expect_list()
            .returning(|id| Err(TranscriptError::TranscriptsDisabled(id.to_string())));

        let err = describe_languages(&backend, &video_id()).await.unwrap_err();
        assert!(matches!(err, TranscriptError::TranscriptsDisabled(_)));
    }
}
