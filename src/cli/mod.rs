use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;
use crate::tools::normalize_lang;

#[derive(Parser)]
#[command(
    name = "yt-transcript",
    about = "YouTube Transcript MCP - Fetch YouTube transcripts from the command line or over MCP",
    version,
    long_about = "Fetches YouTube transcripts and lists their languages. Run `serve` to expose the get_transcript and get_video_language tools to an MCP client over stdio."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Accept-Language header sent to YouTube (overrides the config file)
    #[arg(long, global = true, env = "YT_TRANSCRIPT_ACCEPT_LANGUAGE", value_name = "LANGS")]
    pub accept_language: Option<String>,

    /// HTTP timeout in seconds (overrides the config file)
    #[arg(long, global = true, env = "YT_TRANSCRIPT_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Fetch the transcript of a video
    Transcript {
        /// YouTube URL or 11-character video ID
        #[arg(value_name = "URL_OR_ID")]
        url: String,

        /// Language code (uses the original language if not specified)
        #[arg(short, long, value_name = "LANG")]
        lang: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List the transcript languages of a video
    Languages {
        /// YouTube URL or 11-character video ID
        #[arg(value_name = "URL_OR_ID")]
        url: String,
    },

    /// Print the video ID extracted from a URL
    VideoId {
        /// YouTube URL or 11-character video ID
        #[arg(value_name = "URL_OR_ID")]
        url: String,
    },

    /// Show or initialize the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with segments and metadata
    Json,
    /// SRT subtitle format
    Srt,
}

impl Commands {
    /// Language asked for by `transcript`; a blank `--lang` counts as not given
    pub fn requested_lang(&self) -> Option<&str> {
        match self {
            Commands::Transcript { lang, .. } => normalize_lang(lang.as_deref()),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
        }
    }
}

impl Cli {
    /// Apply command-line and environment overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(accept_language) = &self.accept_language {
            config.backend.accept_language = accept_language.clone();
        }
        if let Some(timeout) = self.timeout {
            config.backend.timeout_secs = timeout;
        }
    }
}
