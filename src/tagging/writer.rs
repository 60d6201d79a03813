use anyhow::Context;
use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt, TagType};
use std::path::{Path, PathBuf};

use super::{InferredTags, TagWriter};
use crate::{Result, TubeMirrorError};

/// Tag type created when a file carries no tag at all
const NEW_TAG_TYPE: TagType = TagType::Id3v2;

/// Tag writer backed by lofty
#[derive(Debug, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    pub fn new() -> Self {
        Self
    }
}

fn write_tags_blocking(path: &Path, tags: &InferredTags) -> Result<()> {
    let mut tagged_file = Probe::open(path)
        .and_then(|probe| probe.read())
        .map_err(|e| TubeMirrorError::TagWriteFailed(format!("{}: {}", path.display(), e)))?;

    let tag_type = if tagged_file.supports_tag_type(NEW_TAG_TYPE) {
        NEW_TAG_TYPE
    } else {
        tagged_file.primary_tag_type()
    };

    if tagged_file.tag(tag_type).is_none() {
        tracing::debug!("No {:?} tag in {}, creating one", tag_type, path.display());
        tagged_file.insert_tag(Tag::new(tag_type));
    }

    let tag = tagged_file
        .tag_mut(tag_type)
        .context("Tag disappeared after insertion")?;

    tag.set_title(tags.title.clone());
    tag.set_artist(tags.artist.clone());

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| TubeMirrorError::TagWriteFailed(format!("{}: {}", path.display(), e)))?;

    Ok(())
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write_tags(&self, path: &Path, tags: &InferredTags) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        let tags = tags.clone();

        tokio::task::spawn_blocking(move || write_tags_blocking(&path, &tags))
            .await
            .context("Tag writer task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> InferredTags {
        InferredTags {
            title: "Song".to_string(),
            artist: "Artist".to_string(),
        }
    }

    /// MPEG-1 Layer III, 128 kbps, 44.1 kHz frames (417 bytes each) with no tag
    fn write_bare_mp3(path: &Path) {
        let mut frame: Vec<u8> = vec![0xFF, 0xFB, 0x90, 0x00];
        frame.resize(417, 0);
        std::fs::write(path, frame.repeat(10)).unwrap();
    }

    #[tokio::test]
    async fn test_creates_id3v2_tag_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Artist - Song.mp3");
        write_bare_mp3(&path);

        LoftyTagWriter::new().write_tags(&path, &tags()).await.unwrap();

        let tagged_file = Probe::open(&path).unwrap().read().unwrap();
        let tag = tagged_file.tag(TagType::Id3v2).expect("ID3v2 tag written");
        assert_eq!(tag.title().as_deref(), Some("Song"));
        assert_eq!(tag.artist().as_deref(), Some("Artist"));
    }

    #[tokio::test]
    async fn test_overwrites_existing_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        write_bare_mp3(&path);

        let writer = LoftyTagWriter::new();
        writer.write_tags(&path, &tags()).await.unwrap();
        let renamed = InferredTags {
            title: "Other Song".to_string(),
            artist: "Other Artist".to_string(),
        };
        writer.write_tags(&path, &renamed).await.unwrap();

        let tagged_file = Probe::open(&path).unwrap().read().unwrap();
        let tag = tagged_file.tag(TagType::Id3v2).unwrap();
        assert_eq!(tag.title().as_deref(), Some("Other Song"));
        assert_eq!(tag.artist().as_deref(), Some("Other Artist"));
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = LoftyTagWriter::new()
            .write_tags(&dir.path().join("missing.mp3"), &tags())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_audio_file_fails_and_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-audio.mp3");
        std::fs::write(&path, b"this is plain text, not an mp3 stream").unwrap();

        let result = LoftyTagWriter::new().write_tags(&path, &tags()).await;

        assert!(result.is_err());
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"this is plain text, not an mp3 stream"
        );
    }
}
