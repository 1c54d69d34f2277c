use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::{BackendResult, TranscriptBackend, TranscriptDescriptor, TranscriptList, TranscriptSegment};
use crate::config::BackendConfig;
use crate::extractors::VideoId;
use crate::TranscriptError;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";
const CONSENT_FORM_ACTION: &str = "action=\"https://consent.youtube.com/s\"";

lazy_static! {
    static ref API_KEY_RE: Regex = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap();
    static ref CONSENT_VALUE_RE: Regex = Regex::new(r#"name="v" value="(.*?)""#).unwrap();
    static ref TEXT_ELEMENT_RE: Regex = Regex::new(r"(?s)<text\b([^>]*[^/])?>(.*?)</text>").unwrap();
    static ref ATTRIBUTE_RE: Regex = Regex::new(r#"([a-zA-Z_:-]+)="([^"]*)""#).unwrap();
    static ref ENTITY_RE: Regex = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"(?i)<[^>]*>").unwrap();
}

/// Transcript backend talking to YouTube's watch page and innertube API.
///
/// Each instance owns its own HTTP client; callers create one per request.
pub struct YoutubeBackend {
    client: Client,
    accept_language: String,
}

impl YoutubeBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            accept_language: config.accept_language.clone(),
        })
    }

    /// Fetch the watch page HTML, accepting the cookie consent form if YouTube shows one
    async fn fetch_watch_html(&self, video_id: &VideoId) -> BackendResult<String> {
        let html = self.get_watch_page(video_id, None).await?;
        if !html.contains(CONSENT_FORM_ACTION) {
            return Ok(html);
        }

        tracing::debug!("Consent form returned for {}, retrying with consent cookie", video_id);

        let consent = CONSENT_VALUE_RE
            .captures(&html)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("CONSENT=YES+{}", m.as_str()))
            .ok_or_else(|| {
                TranscriptError::Backend("Failed to automatically give consent to saving cookies".to_string())
            })?;

        let html = self.get_watch_page(video_id, Some(&consent)).await?;
        if html.contains(CONSENT_FORM_ACTION) {
            return Err(TranscriptError::Backend(
                "Failed to automatically give consent to saving cookies".to_string(),
            ));
        }

        Ok(html)
    }

    async fn get_watch_page(&self, video_id: &VideoId, cookie: Option<&str>) -> BackendResult<String> {
        let url = Url::parse_with_params(WATCH_URL, &[("v", video_id.as_str())])
            .map_err(|e| TranscriptError::Backend(format!("Invalid watch URL: {}", e)))?;

        tracing::debug!("Fetching watch page: {}", url);

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, &self.accept_language);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await?;
        check_status(response.status(), "fetching the watch page")?;

        Ok(response.text().await?)
    }

    /// Query the innertube player endpoint for caption metadata
    async fn fetch_player_data(&self, video_id: &VideoId, api_key: &str) -> BackendResult<Value> {
        let url = Url::parse_with_params(INNERTUBE_PLAYER_URL, &[("key", api_key)])
            .map_err(|e| TranscriptError::Backend(format!("Invalid innertube URL: {}", e)))?;

        tracing::debug!("Requesting innertube player data for {}", video_id);

        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id.as_str(),
        });

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT_LANGUAGE, &self.accept_language)
            .json(&body)
            .send()
            .await?;
        check_status(response.status(), "requesting player data")?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl TranscriptBackend for YoutubeBackend {
    async fn list(&self, video_id: &VideoId) -> BackendResult<TranscriptList> {
        let html = self.fetch_watch_html(video_id).await?;
        let api_key = extract_api_key(&html)?;
        let data = self.fetch_player_data(video_id, &api_key).await?;
        let transcripts = caption_tracks(video_id, &data)?;

        tracing::debug!("Found {} transcripts for {}", transcripts.len(), video_id);

        Ok(TranscriptList::new(video_id.clone(), transcripts))
    }

    async fn fetch(&self, transcript: &TranscriptDescriptor) -> BackendResult<Vec<TranscriptSegment>> {
        tracing::debug!(
            "Fetching {} transcript for {}",
            transcript.language_code,
            transcript.video_id
        );

        let response = self
            .client
            .get(transcript.locator())
            .header(header::ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(disappeared(transcript));
        }
        check_status(response.status(), "fetching the transcript")?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(disappeared(transcript));
        }

        parse_transcript_xml(&body)
    }
}

fn disappeared(transcript: &TranscriptDescriptor) -> TranscriptError {
    TranscriptError::NoTranscriptFound {
        video_id: transcript.video_id.to_string(),
        requested: vec![transcript.language_code.clone()],
    }
}

fn check_status(status: StatusCode, action: &str) -> BackendResult<()> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::Backend(
            "YouTube is receiving too many requests from this IP".to_string(),
        ));
    }
    if !status.is_success() {
        return Err(TranscriptError::Backend(format!("HTTP {} while {}", status, action)));
    }
    Ok(())
}

fn extract_api_key(html: &str) -> BackendResult<String> {
    if let Some(key) = API_KEY_RE.captures(html).and_then(|caps| caps.get(1)) {
        return Ok(key.as_str().to_string());
    }

    if html.contains("class=\"g-recaptcha\"") {
        return Err(TranscriptError::Backend(
            "YouTube is receiving too many requests from this IP".to_string(),
        ));
    }

    Err(TranscriptError::Backend(
        "Could not find the innertube API key on the watch page".to_string(),
    ))
}

/// Turn innertube player data into transcript descriptors, manual tracks first
fn caption_tracks(video_id: &VideoId, data: &Value) -> BackendResult<Vec<TranscriptDescriptor>> {
    check_playability(video_id, &data["playabilityStatus"])?;

    let tracks = data["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()
        .ok_or_else(|| TranscriptError::TranscriptsDisabled(video_id.to_string()))?;

    let (generated, manual): (Vec<_>, Vec<_>) = tracks
        .iter()
        .filter_map(|track| {
            let language_code = track["languageCode"].as_str()?;
            let base_url = track["baseUrl"].as_str()?;
            let language = track["name"]["runs"][0]["text"]
                .as_str()
                .or_else(|| track["name"]["simpleText"].as_str())
                .unwrap_or(language_code);
            let is_generated = track["kind"].as_str() == Some("asr");

            Some(
                TranscriptDescriptor::new(video_id.clone(), language_code, language, is_generated)
                    .with_locator(base_url.replace("&fmt=srv3", "")),
            )
        })
        .partition(|t| t.is_generated);

    Ok(manual.into_iter().chain(generated).collect())
}

fn check_playability(video_id: &VideoId, status: &Value) -> BackendResult<()> {
    let state = status["status"].as_str().unwrap_or("OK");
    if state == "OK" {
        return Ok(());
    }

    let reason = status["reason"].as_str().unwrap_or_default();
    if state == "ERROR" || reason == "This video is unavailable" {
        return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
    }

    let message = if reason.is_empty() {
        format!("Video {} is unplayable ({})", video_id, state)
    } else {
        format!("Video {} is unplayable: {}", video_id, reason)
    };
    Err(TranscriptError::Backend(message))
}

/// Parse a timedtext XML document into segments.
///
/// Caption bodies arrive double-escaped, so entities are decoded twice before
/// inline formatting tags are stripped.
fn parse_transcript_xml(xml: &str) -> BackendResult<Vec<TranscriptSegment>> {
    TEXT_ELEMENT_RE
        .captures_iter(xml)
        .filter(|caps| caps.get(2).map_or(false, |m| !m.as_str().is_empty()))
        .map(|caps| -> BackendResult<TranscriptSegment> {
            let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let start = parse_seconds(attributes, "start")?.unwrap_or(0.0);
            let duration = parse_seconds(attributes, "dur")?.unwrap_or(0.0);

            let raw = &caps[2];
            let text = decode_entities(&decode_entities(raw));
            let text = TAG_RE.replace_all(&text, "").into_owned();

            Ok(TranscriptSegment::new(text, start, duration))
        })
        .collect()
}

fn parse_seconds(attributes: &str, name: &str) -> BackendResult<Option<f64>> {
    let value = ATTRIBUTE_RE
        .captures_iter(attributes)
        .find(|caps| &caps[1] == name)
        .map(|caps| caps[2].to_string());

    value
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| TranscriptError::Backend(format!("Invalid {} attribute in transcript: {}", name, v)))
        })
        .transpose()
}

/// Decode XML and HTML character references
fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };

            decoded
                .map(|c| c.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
