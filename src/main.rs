//! CLI entry point for the OffTube tool.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use offtube::{AppConfig, RapidApiResolver, Video, VideoLibrary};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = AppConfig::from_env()?;
    if let Some(media_dir) = args.media_dir {
        config.media_dir = media_dir;
    }
    debug!(?config, "configuration loaded");

    if config.api.api_key.is_empty() {
        warn!("OFFTUBE_API_KEY is not set; the download API will likely reject requests");
    }

    let resolver = Arc::new(RapidApiResolver::new(&config.api));
    let library = VideoLibrary::open(&config, resolver).await?;

    match args.command {
        Command::Add { url } => {
            let spinner = progress_spinner(args.quiet, "Resolving and downloading...");
            let result = library.add_from_url(&url).await;
            spinner.finish_and_clear();
            let video = result?;
            println!("Added: {} [{}]", video.title, video.id);
            info!(id = %video.id, "add complete");
        }
        Command::List => {
            let videos = library.snapshot().await;
            if videos.is_empty() {
                println!("Library is empty. Add a video with `offtube add <url>`.");
            } else {
                for (index, video) in videos.iter().enumerate() {
                    println!("{index:3}  {}", describe(video));
                }
            }
        }
        Command::Remove { index } => {
            let video = library.remove(index).await?;
            println!("Removed: {} [{}]", video.title, video.id);
        }
        Command::Play { index } => {
            if let Some(index) = index {
                library.select(index).await?;
            }
            let spinner = progress_spinner(args.quiet, "Preparing playback...");
            let result = library.play_current().await;
            spinner.finish_and_clear();
            let video = result?;
            let path = video.local_url.as_deref().map_or_else(
                || "<no local file>".to_string(),
                |p| p.display().to_string(),
            );
            println!("Playing: {} ({})", video.title, path);
        }
    }

    Ok(())
}

/// Renders one library row for `list` output.
fn describe(video: &Video) -> String {
    let marker = if video.is_playable_offline() {
        "local"
    } else {
        "remote"
    };
    format!(
        "{}  {}  [{marker}]",
        video.formatted_duration(),
        video.title
    )
}

/// Creates a spinner for long-running operations, hidden in quiet mode.
fn progress_spinner(quiet: bool, message: &'static str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
