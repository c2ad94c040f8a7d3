//! CLI module for tubeqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// tubeqa - Ask questions about YouTube videos
///
/// Fetches a video's captions, summarizes them, and answers questions using
/// retrieval over the transcript.
#[derive(Parser, Debug)]
#[command(name = "tubeqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TUBEQA_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a video in one paragraph
    Summarize {
        /// YouTube URL or video ID
        url: String,
    },

    /// Ask a single question about a video
    Ask {
        /// YouTube URL or video ID
        url: String,

        /// The question to ask
        question: String,

        /// Number of transcript chunks to retrieve
        #[arg(short, long)]
        k: Option<usize>,

        /// Print the retrieved chunks after the answer
        #[arg(short, long)]
        sources: bool,
    },

    /// Start an interactive question session about a video
    Chat {
        /// YouTube URL or video ID to load first
        url: Option<String>,
    },

    /// Print the normalized transcript of a video
    Transcript {
        /// YouTube URL or video ID
        url: String,

        /// Emit one `Text: ... Start: ...` line per caption segment
        #[arg(short, long)]
        timestamps: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
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
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
