use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use youtube_transcript_mcp::cli::{Cli, Commands};
use youtube_transcript_mcp::config::Config;
use youtube_transcript_mcp::utils::format_duration;
use youtube_transcript_mcp::{
    describe_languages, extract_video_id, get_transcript_result, output, McpServer, YoutubeBackend,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "youtube_transcript_mcp=debug,yt_transcript=debug"
    } else {
        "youtube_transcript_mcp=info,yt_transcript=info"
    };

    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load()?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let requested_lang = cli.command.requested_lang().map(str::to_string);

    match cli.command {
        Commands::Serve => {
            let backend_config = config.backend.clone();
            let server = McpServer::new(config.server.name.clone(), move || {
                YoutubeBackend::new(&backend_config)
            });
            server.serve_stdio().await?;
        }
        Commands::Transcript {
            url,
            format,
            output,
            ..
        } => {
            let backend = YoutubeBackend::new(&config.backend)?;

            tracing::info!("Fetching transcript for: {}", url);

            let result = get_transcript_result(&backend, &url, requested_lang.as_deref()).await;
            if let Some(payload) = result.payload() {
                let covered = payload
                    .segments
                    .last()
                    .map(|s| s.start + s.duration)
                    .unwrap_or(0.0);
                tracing::info!(
                    "Got {} segments covering {}",
                    payload.segments.len(),
                    format_duration(covered)
                );
            }

            match output {
                Some(path) => {
                    output::save_to_file(&result, &path, &format)?;
                    println!("Transcript saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format)?;
                }
            }
        }
        Commands::Languages { url } => {
            let video_id = extract_video_id(&url)?;
            let backend = YoutubeBackend::new(&config.backend)?;
            let summary = describe_languages(&backend, &video_id).await?;
            println!("{}", summary);
        }
        Commands::VideoId { url } => {
            println!("{}", extract_video_id(&url)?);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = config.save()?;
                println!("Configuration written to: {}", path.display());
            }
        }
    }

    Ok(())
}
