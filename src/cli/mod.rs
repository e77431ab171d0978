//! CLI module for Creator Compass.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Creator Compass - creator content analysis and outreach drafting
///
/// Transcribes creator videos, analyzes them with an LLM and writes Markdown
/// reports with a ready-to-send outreach script.
#[derive(Parser, Debug)]
#[command(name = "compass")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a single audio or video file
    Analyze {
        /// Local audio or video file
        file: PathBuf,

        /// Creator name used in the report and the outreach greeting
        #[arg(short, long)]
        author: Option<String>,

        /// Title override (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Analyze a creator folder (notes file plus videos)
    Creator {
        /// Folder containing `Creator - <name>.md` and the creator's videos
        folder: PathBuf,
    },

    /// Analyze every creator folder inside a directory
    Batch {
        /// Directory whose subfolders are creator folders
        dir: PathBuf,

        /// Maximum number of creator folders to process
        #[arg(long)]
        limit: Option<usize>,

        /// Seconds to wait between creators (overrides batch.delay_seconds)
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Inspect and maintain the transcript cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics
    Stats,

    /// Remove every cached transcript
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove duplicate entries for the same content
    Dedupe,

    /// Remove the cached transcript of one file
    Remove {
        /// The media file whose transcript should be dropped
        file: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_flags() {
        let cli = Cli::parse_from(["compass", "-vv", "batch", "creators", "--limit", "3", "--delay", "0"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Batch { dir, limit, delay } => {
                assert_eq!(dir, PathBuf::from("creators"));
                assert_eq!(limit, Some(3));
                assert_eq!(delay, Some(0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_cache_remove() {
        let cli = Cli::parse_from(["compass", "cache", "remove", "clip.mp4"]);
        assert!(matches!(
            cli.command,
            Commands::Cache { action: CacheAction::Remove { .. } }
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
