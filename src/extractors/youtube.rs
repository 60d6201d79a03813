use anyhow::Context;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{parse_playlist_lines, AudioExtractor, MediaItem, MetadataSource, PlaylistEntry};
use crate::config::ExtractorConfig;
use crate::{Result, TubeMirrorError};

/// Stem of the file yt-dlp writes inside the staging directory
const STAGING_STEM: &str = "audio";

/// YouTube metadata and audio extraction using yt-dlp
pub struct YtDlp {
    yt_dlp_path: String,
    audio_format: String,
    audio_quality: String,
}

impl YtDlp {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
        }
    }

    /// Run yt-dlp with the given arguments and return its stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.yt_dlp_path)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to launch {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(TubeMirrorError::MetadataUnavailable(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                error.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MetadataSource for YtDlp {
    async fn fetch_item(&self, url: &str) -> Result<MediaItem> {
        tracing::debug!("Extracting video info for: {}", url);

        let stdout = self.run(&["--dump-json", "--no-playlist", url]).await?;

        let mut item: MediaItem = serde_json::from_str(stdout.trim())
            .context("Failed to parse yt-dlp video info")?;
        if item.source_url.is_empty() {
            item.source_url = url.to_string();
        }

        Ok(item)
    }

    async fn fetch_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>> {
        tracing::debug!("Listing playlist: {}", url);

        let stdout = self.run(&["--dump-json", "--flat-playlist", url]).await?;

        Ok(parse_playlist_lines(&stdout))
    }
}

#[async_trait]
impl AudioExtractor for YtDlp {
    /// Extract into a private staging directory next to `destination`, then rename into place.
    ///
    /// The final path only ever holds a fully converted file; an interrupted run leaves
    /// at most a stale staging directory behind.
    async fn extract_audio(&self, url: &str, destination: &Path) -> Result<()> {
        let parent = destination
            .parent()
            .context("Destination has no parent directory")?;

        let staging = tempfile::Builder::new()
            .prefix(".tube-mirror-")
            .tempdir_in(parent)
            .context("Failed to create staging directory")?;

        let template = staging.path().join(format!("{}.%(ext)s", STAGING_STEM));
        let template = template.to_string_lossy();

        tracing::debug!("Downloading audio for {} via {}", url, template);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--format", "bestaudio",
                "--extract-audio",
                "--audio-format", &self.audio_format,
                "--audio-quality", &self.audio_quality,
                "--output", &template,
                "--no-playlist",
                "--newline",
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to launch {}", self.yt_dlp_path))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::trace!("yt-dlp: {}", line);
        }

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(TubeMirrorError::ExtractionFailed(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                error.trim()
            )));
        }

        let produced = staging
            .path()
            .join(format!("{}.{}", STAGING_STEM, self.audio_format));
        if !produced.exists() {
            anyhow::bail!(TubeMirrorError::ExtractionFailed(format!(
                "yt-dlp reported success but {} was not produced",
                produced.display()
            )));
        }

        tokio::fs::rename(&produced, destination)
            .await
            .with_context(|| format!("Failed to move audio into {}", destination.display()))?;

        Ok(())
    }

    fn tool_name(&self) -> &'static str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn missing_tool() -> YtDlp {
        let mut config = Config::default().extractor;
        config.yt_dlp_path = "definitely-not-a-real-yt-dlp-binary".to_string();
        YtDlp::new(&config)
    }

    #[tokio::test]
    async fn test_fetch_item_reports_launch_failure() {
        let result = missing_tool().fetch_item("https://youtu.be/abc").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_extract_audio_leaves_no_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("Song.mp3");

        let result = missing_tool()
            .extract_audio("https://youtu.be/abc", &destination)
            .await;

        assert!(result.is_err());
        assert!(!destination.exists());
        // Staging directory is removed when it goes out of scope
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
