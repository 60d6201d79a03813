use serde::Deserialize;

use super::completion::CompletionService;
use super::InferredTags;

/// Artist used by the heuristic split when a title carries no delimiter
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

const SYSTEM_PROMPT: &str = "You extract music metadata from video titles. \
Reply with a single JSON object with exactly two string keys, \"title\" and \"artist\". \
Remove noise such as \"Official Video\", \"Lyrics\", \"HD\" or channel names from the title. \
Do not wrap the reply in markdown or code fences and do not add any other text.";

#[derive(Deserialize)]
struct TagReply {
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: String,
}

/// Turns raw video titles into title/artist pairs
pub struct TagInference {
    service: Option<Box<dyn CompletionService>>,
}

impl TagInference {
    /// Inference backed by a completion service
    pub fn new(service: Box<dyn CompletionService>) -> Self {
        Self { service: Some(service) }
    }

    /// Inference without credentials: always the heuristic split
    pub fn heuristic_only() -> Self {
        Self { service: None }
    }

    /// Infer tags for a raw title.
    ///
    /// Service errors fall back to the heuristic split; an unparseable reply yields empty
    /// tags, which callers treat as "leave the file untagged".
    pub async fn infer(&self, raw_title: &str) -> InferredTags {
        let Some(service) = &self.service else {
            tracing::debug!("No completion credentials, splitting title heuristically");
            return heuristic_split(raw_title);
        };

        let prompt = format!("Video title: {}", raw_title);
        match service.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(reply) => {
                let tags = parse_reply(&reply);
                if tags.is_usable() {
                    tracing::info!("Inferred tags: {} - {}", tags.artist, tags.title);
                }
                tags
            }
            Err(e) => {
                tracing::warn!("Tag inference failed, using title split: {:#}", e);
                heuristic_split(raw_title)
            }
        }
    }
}

/// Split `"Artist - Title"` on the first delimiter
pub fn heuristic_split(raw_title: &str) -> InferredTags {
    match raw_title.split_once(" - ") {
        Some((artist, title)) => InferredTags {
            title: title.trim().to_string(),
            artist: artist.trim().to_string(),
        },
        None => InferredTags {
            title: raw_title.trim().to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
        },
    }
}

/// Parse a completion reply, retrying once with code fences stripped
pub fn parse_reply(reply: &str) -> InferredTags {
    let parsed = serde_json::from_str::<TagReply>(reply.trim())
        .or_else(|_| serde_json::from_str::<TagReply>(strip_code_fence(reply)));

    match parsed {
        Ok(tags) => InferredTags {
            title: tags.title.trim().to_string(),
            artist: tags.artist.trim().to_string(),
        },
        Err(e) => {
            tracing::warn!("Could not parse tag reply ({}): {}", e, reply);
            InferredTags::default()
        }
    }
}

fn strip_code_fence(reply: &str) -> &str {
    let mut text = reply.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string, e.g. "json"
        text = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest.trim_start_matches("json"),
        };
    }

    text.trim().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagging::completion::MockCompletionService;

    fn with_reply(reply: &'static str) -> TagInference {
        let mut service = MockCompletionService::new();
        service
            .expect_complete()
            .times(1)
            .returning(move |_, _| Ok(reply.to_string()));
        TagInference::new(Box::new(service))
    }

    #[tokio::test]
    async fn test_no_credentials_splits_on_delimiter() {
        let tags = TagInference::heuristic_only().infer("Artist - Song").await;
        assert_eq!(tags.title, "Song");
        assert_eq!(tags.artist, "Artist");
    }

    #[tokio::test]
    async fn test_no_credentials_without_delimiter() {
        let tags = TagInference::heuristic_only().infer("Just A Title").await;
        assert_eq!(tags.title, "Just A Title");
        assert_eq!(tags.artist, UNKNOWN_ARTIST);
    }

    #[test]
    fn test_heuristic_split_keeps_remainder() {
        let tags = heuristic_split("Band - Song - Live at Wembley");
        assert_eq!(tags.artist, "Band");
        assert_eq!(tags.title, "Song - Live at Wembley");
    }

    #[tokio::test]
    async fn test_plain_json_reply() {
        let tags = with_reply(r#"{"title": "Bohemian Rhapsody", "artist": "Queen"}"#)
            .infer("Queen – Bohemian Rhapsody (Official Video Remastered)")
            .await;
        assert_eq!(tags.title, "Bohemian Rhapsody");
        assert_eq!(tags.artist, "Queen");
    }

    #[tokio::test]
    async fn test_fenced_reply_parses_after_cleanup() {
        let tags = with_reply("```json\n{\"title\":\"A\",\"artist\":\"B\"}\n```")
            .infer("whatever")
            .await;
        assert_eq!((tags.title.as_str(), tags.artist.as_str()), ("A", "B"));
    }

    #[tokio::test]
    async fn test_malformed_reply_yields_empty_tags() {
        let tags = with_reply("Sorry, I can't help with that.")
            .infer("Artist - Song")
            .await;
        assert_eq!(tags, InferredTags::default());
        assert!(!tags.is_usable());
    }

    #[tokio::test]
    async fn test_service_error_falls_back_to_split() {
        let mut service = MockCompletionService::new();
        service
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("429 quota exceeded")));

        let tags = TagInference::new(Box::new(service)).infer("Artist - Song").await;
        assert_eq!(tags.title, "Song");
        assert_eq!(tags.artist, "Artist");
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }
}
