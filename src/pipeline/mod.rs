use std::path::{Path, PathBuf};

use crate::config::{Config, Credentials};
use crate::extractors::youtube::YtDlp;
use crate::extractors::{AudioExtractor, MediaItem, MetadataSource};
use crate::notify::{Notifier, SilentNotifier, TelegramNotifier};
use crate::sync::{sync_logged, FileSync, RsyncSync};
use crate::tagging::{InferredTags, LoftyTagWriter, OpenAiClient, TagInference, TagWriter};
use crate::utils::{format_file_size, sanitize_filename};
use crate::Result;

pub mod clock;
pub mod playlist;

pub use clock::{Clock, TokioClock};
pub use playlist::PlaylistReport;

/// Outcome of the download step for one item
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Metadata the file was named after
    pub item: MediaItem,

    /// Deterministic output path, `<output_dir>/<sanitized title>.<ext>`
    pub path: PathBuf,

    /// The file exists at `path`
    pub success: bool,

    /// The file was already there and the extractor was not run
    pub already_present: bool,
}

/// What happened to one item across all stages
#[derive(Debug, Clone, Default)]
pub struct ItemReport {
    pub url: String,
    pub title: Option<String>,
    pub path: Option<PathBuf>,
    pub downloaded: bool,
    pub already_present: bool,
    pub tags: Option<InferredTags>,
    pub tagged: bool,
    /// `None` when sync is disabled for the run
    pub synced: Option<bool>,
}

impl ItemReport {
    /// An item counts as done once its audio file exists, tagged or not
    pub fn succeeded(&self) -> bool {
        self.downloaded
    }

    /// Human-readable status line for notifications
    pub fn summary(&self) -> String {
        let title = self.title.as_deref().unwrap_or(&self.url);

        if !self.downloaded {
            return format!("❌ Download failed: {}", title);
        }

        let mut lines = vec![if self.already_present {
            format!("✅ Already downloaded: {}", title)
        } else {
            format!("✅ Downloaded: {}", title)
        }];

        match (&self.tags, self.tagged) {
            (Some(tags), true) => lines.push(format!("🏷 {} - {}", tags.artist, tags.title)),
            _ => lines.push("🏷 Tags unchanged".to_string()),
        }

        match self.synced {
            Some(true) => lines.push("☁️ Synced to media server".to_string()),
            Some(false) => lines.push("⚠️ Sync to media server failed".to_string()),
            None => {}
        }

        lines.join("\n")
    }
}

/// Per-run switches that come from the command line
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub sync: bool,
    pub notify: bool,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sync: true,
            notify: true,
            show_progress: true,
        }
    }
}

/// The collaborators a pipeline drives
pub struct Components {
    pub source: Box<dyn MetadataSource>,
    pub extractor: Box<dyn AudioExtractor>,
    pub inference: TagInference,
    pub writer: Box<dyn TagWriter>,
    pub sync: Option<Box<dyn FileSync>>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Box<dyn Clock>,
}

/// Download, tag, sync and notify, one item at a time
pub struct Pipeline {
    source: Box<dyn MetadataSource>,
    extractor: Box<dyn AudioExtractor>,
    inference: TagInference,
    writer: Box<dyn TagWriter>,
    sync: Option<Box<dyn FileSync>>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    watch_url_base: String,
    audio_extension: String,
    show_progress: bool,
}

impl Pipeline {
    /// Create a pipeline wired to yt-dlp, the completion API, lofty, rsync and Telegram
    pub fn new(config: &Config, credentials: &Credentials, options: RunOptions) -> Result<Self> {
        let inference = match &credentials.openai_api_key {
            Some(key) => TagInference::new(Box::new(OpenAiClient::new(&config.inference, key)?)),
            None => {
                tracing::info!("OPENAI_API_KEY not set, tags will be split from the video title");
                TagInference::heuristic_only()
            }
        };

        let sync: Option<Box<dyn FileSync>> = if options.sync && config.sync.enabled {
            Some(Box::new(RsyncSync::new(&config.sync)))
        } else {
            tracing::info!("Remote sync disabled for this run");
            None
        };

        let notifier: Box<dyn Notifier> = if options.notify {
            Box::new(TelegramNotifier::new(
                &config.notify,
                credentials.telegram_bot_token.clone(),
                credentials.chat_id(config),
            ))
        } else {
            Box::new(SilentNotifier)
        };

        let components = Components {
            source: Box::new(YtDlp::new(&config.extractor)),
            extractor: Box::new(YtDlp::new(&config.extractor)),
            inference,
            writer: Box::new(LoftyTagWriter::new()),
            sync,
            notifier,
            clock: Box::new(TokioClock),
        };

        Ok(Self::from_components(components, config, options.show_progress))
    }

    /// Create a pipeline from explicit collaborators
    pub fn from_components(components: Components, config: &Config, show_progress: bool) -> Self {
        Self {
            source: components.source,
            extractor: components.extractor,
            inference: components.inference,
            writer: components.writer,
            sync: components.sync,
            notifier: components.notifier,
            clock: components.clock,
            watch_url_base: config.extractor.watch_url_base.clone(),
            audio_extension: config.extractor.audio_format.clone(),
            show_progress,
        }
    }

    /// Resolve the title and produce the audio file, skipping the extractor when the
    /// deterministic output path already exists.
    ///
    /// Returns `None` when metadata could not be fetched.
    pub async fn download(&self, url: &str, output_dir: &Path) -> Option<DownloadResult> {
        let item = match self.source.fetch_item(url).await {
            Ok(item) => item,
            Err(e) => {
                tracing::error!("Could not get video info for {}: {:#}", url, e);
                return None;
            }
        };

        let title = item.display_title();
        let path = output_dir.join(format!(
            "{}.{}",
            sanitize_filename(Some(&title)),
            self.audio_extension
        ));

        let mut result = DownloadResult {
            item,
            path,
            success: false,
            already_present: false,
        };

        if result.path.exists() {
            tracing::info!("File already exists: {}", result.path.display());
            result.success = true;
            result.already_present = true;
            return Some(result);
        }

        if let Err(e) = fs_err::create_dir_all(output_dir) {
            tracing::error!("Could not create output directory: {}", e);
            return Some(result);
        }

        tracing::info!("Downloading: {}", title);

        match self.extractor.extract_audio(url, &result.path).await {
            Ok(()) => {
                let size = fs_err::metadata(&result.path).map(|m| m.len()).unwrap_or(0);
                tracing::info!(
                    "Downloaded: {} ({})",
                    result.path.display(),
                    format_file_size(size)
                );
                result.success = true;
            }
            Err(e) => {
                tracing::error!("Error downloading {} with {}: {:#}", url, self.extractor.tool_name(), e);
            }
        }

        Some(result)
    }

    /// Run every stage for one URL. Stage failures are logged and recorded, never raised.
    pub async fn process_item(&self, url: &str, output_dir: &Path, notify: bool) -> ItemReport {
        let mut report = ItemReport {
            url: url.to_string(),
            ..Default::default()
        };

        let download = self.download(url, output_dir).await;
        if let Some(download) = &download {
            report.title = Some(download.item.display_title());
            report.path = Some(download.path.clone());
            report.downloaded = download.success;
            report.already_present = download.already_present;
        }

        let Some(download) = download.filter(|d| d.success) else {
            if notify {
                self.notifier.notify(&report.summary()).await;
            }
            return report;
        };

        let tags = self.inference.infer(&download.item.display_title()).await;
        if tags.is_usable() {
            match self.writer.write_tags(&download.path, &tags).await {
                Ok(()) => {
                    tracing::info!("Tagged {} as {} - {}", download.path.display(), tags.artist, tags.title);
                    report.tagged = true;
                }
                Err(e) => tracing::error!("Failed to write tags to {}: {:#}", download.path.display(), e),
            }
        } else {
            tracing::warn!("No usable tags for {}, leaving file untagged", download.path.display());
        }
        report.tags = Some(tags);

        if let Some(sync) = &self.sync {
            report.synced = Some(sync_logged(sync.as_ref(), &download.path).await);
        }

        if notify {
            self.notifier.notify(&report.summary()).await;
        }

        report
    }

    /// Watch URL for a playlist entry id
    pub fn watch_url(&self, id: &str) -> String {
        format!("{}{}", self.watch_url_base, id)
    }
}
