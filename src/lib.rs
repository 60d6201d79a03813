//! Tube Mirror - A Rust CLI tool for mirroring YouTube audio to a media server
//!
//! This library downloads audio through yt-dlp, infers clean title/artist tags with an
//! OpenAI-compatible chat completion service, writes those tags into the MP3, pushes the
//! file to a remote host with rsync and reports the outcome to a Telegram chat.

pub mod cli;
pub mod config;
pub mod extractors;
pub mod notify;
pub mod pipeline;
pub mod sync;
pub mod tagging;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::{Config, Credentials};
pub use extractors::{AudioExtractor, MediaItem, MetadataSource, PlaylistEntry};
pub use notify::Notifier;
pub use pipeline::{DownloadResult, ItemReport, Pipeline, PlaylistReport};
pub use sync::{FileSync, SyncOutcome};
pub use tagging::{InferredTags, TagInference, TagWriter};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to tube-mirror
#[derive(thiserror::Error, Debug)]
pub enum TubeMirrorError {
    #[error("Required tool is not available: {0}")]
    ToolMissing(String),

    #[error("Could not fetch metadata: {0}")]
    MetadataUnavailable(String),

    #[error("Audio extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Tag write failed: {0}")]
    TagWriteFailed(String),

    #[error("Remote sync failed: {0}")]
    SyncFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
