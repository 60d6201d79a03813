use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod completion;
pub mod inference;
pub mod writer;

pub use completion::{CompletionService, OpenAiClient};
pub use inference::TagInference;
pub use writer::LoftyTagWriter;

use crate::Result;

/// Title and artist inferred for one item. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredTags {
    pub title: String,
    pub artist: String,
}

impl InferredTags {
    /// Both fields are present, so the tags are worth writing
    pub fn is_usable(&self) -> bool {
        !self.title.is_empty() && !self.artist.is_empty()
    }
}

/// Writes title/artist tags into an audio file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn write_tags(&self, path: &Path, tags: &InferredTags) -> Result<()>;
}
