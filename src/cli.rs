//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Offline video library.
///
/// OffTube resolves a pasted video URL through a download API, stores the
/// media file locally, and plays entries back from a most-recent-first
/// library.
#[derive(Parser, Debug)]
#[command(name = "offtube")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Media directory (overrides OFFTUBE_MEDIA_DIR)
    #[arg(long)]
    pub media_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Library operations exposed on the command line.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a video URL and download it into the library
    Add {
        /// The video page URL to resolve
        url: String,
    },
    /// List the library, most recent first
    List,
    /// Remove a video (and its backing files) by list index
    Remove {
        /// Zero-based index into the list
        index: usize,
    },
    /// Play a video, downloading it first when no local copy exists
    Play {
        /// Zero-based index to play; defaults to the current cursor
        #[arg(long)]
        index: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_add_parses() {
        let args = Args::try_parse_from(["offtube", "add", "https://youtu.be/abc123"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        match args.command {
            Command::Add { url } => assert_eq!(url, "https://youtu.be/abc123"),
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["offtube", "-vv", "list"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_play_index_is_optional() {
        let args = Args::try_parse_from(["offtube", "play"]).unwrap();
        assert!(matches!(args.command, Command::Play { index: None }));

        let args = Args::try_parse_from(["offtube", "play", "--index", "2"]).unwrap();
        assert!(matches!(args.command, Command::Play { index: Some(2) }));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Args::try_parse_from(["offtube"]).is_err());
    }

    #[test]
    fn test_cli_media_dir_flag() {
        let args =
            Args::try_parse_from(["offtube", "--media-dir", "/tmp/media", "list"]).unwrap();
        assert_eq!(args.media_dir, Some(PathBuf::from("/tmp/media")));
    }
}
