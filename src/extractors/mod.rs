use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod youtube;

use crate::Result;

/// Descriptive metadata for one video, as reported by the extraction tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    /// Platform-assigned id
    #[serde(default)]
    pub id: String,

    /// Raw, platform-supplied title
    #[serde(default)]
    pub title: Option<String>,

    /// URL the item was resolved from
    #[serde(default, rename = "webpage_url")]
    pub source_url: String,
}

impl MediaItem {
    /// Title to name the file after, falling back to one built from the id
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                let id = if self.id.is_empty() { "unknown" } else { self.id.as_str() };
                format!("youtube_video_{}", id)
            }
        }
    }
}

/// Lightweight record from a flat playlist listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistEntry {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,
}

/// Resolves URLs to descriptive metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch metadata for a single video, never expanding playlists
    async fn fetch_item(&self, url: &str) -> Result<MediaItem>;

    /// List the entries of a playlist in order. Unparseable entries are dropped.
    async fn fetch_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>>;
}

/// Produces a compressed audio file from a video URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Download the best audio stream of `url` and leave an MP3 at `destination`
    async fn extract_audio(&self, url: &str, destination: &Path) -> Result<()>;

    /// Get the name of the backing tool
    fn tool_name(&self) -> &'static str;
}

/// Parse newline-delimited JSON from a flat playlist dump, skipping lines that fail to parse
pub fn parse_playlist_lines(stdout: &str) -> Vec<PlaylistEntry> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<PlaylistEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping playlist line: {}", e);
                None
            }
        })
        .collect()
}
