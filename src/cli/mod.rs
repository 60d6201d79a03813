use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tubemirror",
    about = "Tube Mirror - Download YouTube audio as tagged MP3 files and mirror them to a media server",
    version,
    long_about = "A CLI tool that downloads audio from YouTube videos or playlists with yt-dlp, infers clean title/artist tags with an OpenAI-compatible API, writes them into the MP3 and pushes the result to a remote server over rsync."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download audio from a video or playlist URL
    Download {
        /// Video or playlist URL (playlists are detected by "playlist" or "list=" in the URL)
        #[arg(value_name = "URL")]
        url: String,

        /// Directory to save the MP3 files (default: ./downloads)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Delay in seconds between playlist items (default: 20)
        #[arg(short, long, value_name = "SECS")]
        delay: Option<u64>,

        /// Skip pushing files to the remote server
        #[arg(long)]
        no_sync: bool,

        /// Skip Telegram notifications
        #[arg(long)]
        no_notify: bool,
    },

    /// Show or locate the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

/// Whether a URL points at a playlist rather than a single video
pub fn is_playlist_url(url: &str) -> bool {
    url.contains("playlist") || url.contains("list=")
}
