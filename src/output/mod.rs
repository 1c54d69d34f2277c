use anyhow::Result;
use std::path::Path;

use crate::backend::TranscriptSegment;
use crate::cli::OutputFormat;
use crate::transcript::{SelectionResult, TranscriptPayload};
use crate::utils::format_srt_timestamp;

/// Render a transcript result in the requested format.
///
/// JSON always renders, including failures. Text and SRT need a transcript
/// and turn a failure into an error.
pub fn render(result: &SelectionResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(require_payload(result)?.full_text.clone()),
        OutputFormat::Srt => Ok(format_as_srt(&require_payload(result)?.segments)),
    }
}

fn require_payload(result: &SelectionResult) -> Result<&TranscriptPayload> {
    match result {
        SelectionResult::Success(payload) => Ok(payload),
        SelectionResult::Failure(failure) => anyhow::bail!("{}", failure.message),
    }
}

/// Format segments as SRT subtitles
pub fn format_as_srt(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .zip(1..)
        .map(|(segment, index)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                index,
                format_srt_timestamp(segment.start),
                format_srt_timestamp(segment.start + segment.duration),
                segment.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Save rendered output to file
pub fn save_to_file(result: &SelectionResult, path: &Path, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print rendered output to console
pub fn print_to_console(result: &SelectionResult, format: &OutputFormat) -> Result<()> {
    let content = render(result, format)?;
    println!("{}", content);
    Ok(())
}
