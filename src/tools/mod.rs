//! Tool surface exposed to MCP clients.
//!
//! Both tools return plain text: the result on success, `Error: <message>` on
//! failure. Nothing raised by the backend escapes a tool call.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::{BackendResult, TranscriptBackend};
use crate::extractors::extract_video_id;
use crate::transcript::{describe_languages, get_transcript_result, SelectionResult};

pub const GET_TRANSCRIPT: &str = "get_transcript";
pub const GET_VIDEO_LANGUAGE: &str = "get_video_language";

/// Tool metadata advertised through `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct GetTranscriptArgs {
    url: String,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetVideoLanguageArgs {
    url: String,
}

/// Get all available tools.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_TRANSCRIPT.to_string(),
            description: "Get transcript from a YouTube video. \
                Returns the full transcript text."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "YouTube video URL or video ID"
                    },
                    "lang": {
                        "type": "string",
                        "description": "Language code (e.g., 'en', 'ko'). If not specified, uses the original language."
                    }
                },
                "required": ["url"]
            }),
        },
        ToolDefinition {
            name: GET_VIDEO_LANGUAGE.to_string(),
            description: "Get the original language of a YouTube video. \
                Lists manually created subtitles and the auto-generated original language track."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "YouTube video URL or video ID"
                    }
                },
                "required": ["url"]
            }),
        },
    ]
}

/// Text produced by a tool call, flagged when it reports a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error: {}", message),
            is_error: true,
        }
    }
}

/// Full transcript text of a video, or an `Error:` line
pub async fn get_transcript<B>(backend: &B, url: &str, lang: Option<&str>) -> String
where
    B: TranscriptBackend + ?Sized,
{
    transcript_output(backend, url, lang).await.text
}

/// Language summary of a video, or an `Error:` line
pub async fn get_video_language<B>(backend: &B, url: &str) -> String
where
    B: TranscriptBackend + ?Sized,
{
    language_output(backend, url).await.text
}

async fn transcript_output<B>(backend: &B, url: &str, lang: Option<&str>) -> ToolOutput
where
    B: TranscriptBackend + ?Sized,
{
    match get_transcript_result(backend, url, lang).await {
        SelectionResult::Success(payload) => ToolOutput::success(payload.full_text),
        SelectionResult::Failure(failure) => ToolOutput::error(failure.message),
    }
}

async fn language_output<B>(backend: &B, url: &str) -> ToolOutput
where
    B: TranscriptBackend + ?Sized,
{
    let video_id = match extract_video_id(url) {
        Ok(video_id) => video_id,
        Err(err) => return ToolOutput::error(err),
    };

    match describe_languages(backend, &video_id).await {
        Ok(summary) => ToolOutput::success(summary.to_string()),
        Err(err) => {
            tracing::warn!("Language lookup failed for {}: {}", video_id, err);
            ToolOutput::error(err)
        }
    }
}

/// Dispatch a tool call by name.
///
/// A fresh backend is built for every call and dropped when the call returns.
pub async fn call_tool<F, B>(make_backend: &F, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>
where
    F: Fn() -> BackendResult<B>,
    B: TranscriptBackend,
{
    match name {
        GET_TRANSCRIPT => {
            let args: GetTranscriptArgs = parse_arguments(name, arguments)?;
            let lang = normalize_lang(args.lang.as_deref());
            tracing::info!("get_transcript url={} lang={:?}", args.url, lang);

            Ok(match make_backend() {
                Ok(backend) => transcript_output(&backend, &args.url, lang).await,
                Err(err) => ToolOutput::error(err),
            })
        }
        GET_VIDEO_LANGUAGE => {
            let args: GetVideoLanguageArgs = parse_arguments(name, arguments)?;
            tracing::info!("get_video_language url={}", args.url);

            Ok(match make_backend() {
                Ok(backend) => language_output(&backend, &args.url).await,
                Err(err) => ToolOutput::error(err),
            })
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// An empty language means "not specified"
pub fn normalize_lang(lang: Option<&str>) -> Option<&str> {
    lang.filter(|lang| !lang.is_empty())
}

fn parse_arguments<T: serde::de::DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::test_support::listing;
    use crate::backend::{MockTranscriptBackend, TranscriptSegment};
    use crate::TranscriptError;

    fn mock_factory() -> impl Fn() -> BackendResult<MockTranscriptBackend> {
        || {
            let mut backend = MockTranscriptBackend::new();
            backend
                .expect_list()
                .returning(|_| Ok(listing(&[("en", "English", false), ("ko", "Korean (auto-generated)", true)])));
            backend.expect_fetch().returning(|transcript| {
                Ok(vec![
                    TranscriptSegment::new(format!("{} one", transcript.language_code), 0.0, 1.0),
                    TranscriptSegment::new("two", 1.0, 1.0),
                ])
            });
            Ok(backend)
        }
    }

    #[test]
    fn test_tool_definitions() {
        let tools = tool_definitions();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![GET_TRANSCRIPT, GET_VIDEO_LANGUAGE]);
        assert_eq!(tools[0].input_schema["required"], json!(["url"]));

        let value = serde_json::to_value(&tools[1]).unwrap();
        assert!(value.get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn test_get_transcript_text() {
        let factory = mock_factory();
        let text = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "dQw4w9WgXcQ" }))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "en one two");

        let text = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "https://youtu.be/dQw4w9WgXcQ", "lang": "ko" }))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "ko one two");
    }

    #[tokio::test]
    async fn test_empty_lang_means_unspecified() {
        let factory = mock_factory();
        let text = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "dQw4w9WgXcQ", "lang": "" }))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "en one two");
    }

    #[tokio::test]
    async fn test_get_transcript_errors_become_text() {
        let factory = mock_factory();
        let output = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "dQw4w9WgXcQ", "lang": "fr" }))
            .await
            .unwrap();
        assert!(output.is_error);
        assert_eq!(output.text, "Error: Language 'fr' not available. Available: en, ko");

        let text = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "nope" }))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "Error: Could not extract video ID from: nope");
    }

    #[tokio::test]
    async fn test_get_video_language() {
        let factory = mock_factory();
        let output = call_tool(&factory, GET_VIDEO_LANGUAGE, json!({ "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }))
            .await
            .unwrap();
        assert!(!output.is_error);
        assert_eq!(
            output.text,
            "Video ID: dQw4w9WgXcQ\nManual subtitles: en (English)\nOriginal language: ko (Korean (auto-generated))"
        );
    }

    #[tokio::test]
    async fn test_error_flag_follows_outcome_not_text() {
        let factory = || -> BackendResult<MockTranscriptBackend> {
            let mut backend = MockTranscriptBackend::new();
            backend
                .expect_list()
                .returning(|_| Ok(listing(&[("en", "English", false)])));
            backend
                .expect_fetch()
                .returning(|_| Ok(vec![TranscriptSegment::new("Error: 404 is the name of this song", 0.0, 2.0)]));
            Ok(backend)
        };

        let output = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "dQw4w9WgXcQ" }))
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::success("Error: 404 is the name of this song"));
    }

    #[test]
    fn test_normalize_lang() {
        assert_eq!(normalize_lang(Some("")), None);
        assert_eq!(normalize_lang(Some("ko")), Some("ko"));
        assert_eq!(normalize_lang(None), None);
    }

    #[tokio::test]
    async fn test_get_video_language_error() {
        let mut backend = MockTranscriptBackend::new();
        backend
            .expect_list()
            .returning(|id| Err(TranscriptError::VideoUnavailable(id.to_string())));

        let text = get_video_language(&backend, "dQw4w9WgXcQ").await;
        assert_eq!(text, "Error: Video is unavailable");
    }

    #[tokio::test]
    async fn test_backend_construction_failure() {
        let factory = || -> BackendResult<MockTranscriptBackend> {
            Err(TranscriptError::Backend("no TLS backend".to_string()))
        };
        let text = call_tool(&factory, GET_TRANSCRIPT, json!({ "url": "dQw4w9WgXcQ" }))
            .await
            .unwrap()
            .text;
        assert_eq!(text, "Error: no TLS backend");
    }

    #[tokio::test]
    async fn test_bad_calls() {
        let factory = mock_factory();
        let err = call_tool(&factory, "summarize", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "summarize"));

        let err = call_tool(&factory, GET_TRANSCRIPT, json!({ "lang": "en" })).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let err = call_tool(&factory, GET_VIDEO_LANGUAGE, Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
