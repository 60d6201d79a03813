use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::Pipeline;
use crate::sync::sync_logged;
use crate::utils::format_duration;

/// Seconds between countdown log lines while waiting between items
const COUNTDOWN_STEP_SECS: u64 = 10;

/// Outcome of a playlist run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistReport {
    /// Entries listed by the playlist
    pub total: usize,

    /// Items whose audio file exists after the run
    pub succeeded: usize,

    pub failed: usize,

    /// Files in the output directory pushed by the final sync pass
    pub resynced: usize,

    /// The playlist was non-empty and every entry was visited.
    /// Individual item failures do not clear this flag.
    pub completed: bool,
}

impl PlaylistReport {
    pub fn summary(&self, url: &str) -> String {
        format!(
            "🎵 Playlist finished: {}\n✅ {}/{} downloaded, ❌ {} failed\n☁️ {} files synced\n🕒 {}",
            url,
            self.succeeded,
            self.total,
            self.failed,
            self.resynced,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )
    }
}

impl Pipeline {
    /// Download every entry of a playlist, one at a time, waiting `delay_secs` between entries.
    ///
    /// Per-item notifications are suppressed; one aggregate notification is sent at the end
    /// after every audio file in `output_dir` has been synced again.
    pub async fn run_playlist(&self, url: &str, output_dir: &Path, delay_secs: u64) -> PlaylistReport {
        let entries = match self.source.fetch_playlist(url).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Error getting playlist info: {:#}", e);
                Vec::new()
            }
        };

        let mut report = PlaylistReport {
            total: entries.len(),
            ..Default::default()
        };

        if entries.is_empty() {
            tracing::error!("No videos found in playlist: {}", url);
            self.notifier
                .notify(&format!("❌ No videos found in playlist: {}", url))
                .await;
            return report;
        }

        tracing::info!("Playlist: {}", url);
        tracing::info!("Number of videos: {}", entries.len());

        let progress = if self.show_progress {
            let bar = ProgressBar::new(entries.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar.set_message("Downloading playlist");
            bar
        } else {
            ProgressBar::hidden()
        };

        for (index, entry) in entries.iter().enumerate() {
            let video_url = self.watch_url(&entry.id);
            tracing::info!(
                "Processing video {}/{}: {}",
                index + 1,
                entries.len(),
                entry.title.as_deref().unwrap_or("Unknown title")
            );

            let item = self.process_item(&video_url, output_dir, false).await;
            if item.succeeded() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
                tracing::error!("Failed to process {}", video_url);
            }
            progress.inc(1);

            if index + 1 < entries.len() {
                self.wait_between_items(delay_secs).await;
            }
        }

        progress.finish_with_message("Playlist download completed");
        tracing::info!("Playlist download completed!");

        report.resynced = self.resync_directory(output_dir).await;
        report.completed = true;

        self.notifier.notify(&report.summary(url)).await;

        report
    }

    /// Sleep for `delay_secs`, logging the remaining time at every multiple of ten seconds
    async fn wait_between_items(&self, delay_secs: u64) {
        if delay_secs == 0 {
            return;
        }

        tracing::info!("Waiting {} before next download...", format_duration(delay_secs));

        let mut remaining = delay_secs;
        while remaining > 0 {
            let step = match remaining % COUNTDOWN_STEP_SECS {
                0 => {
                    tracing::info!("Waiting {} more seconds...", remaining);
                    COUNTDOWN_STEP_SECS
                }
                partial => partial,
            };
            self.clock.sleep(Duration::from_secs(step)).await;
            remaining -= step;
        }
    }

    /// Push every audio file in `output_dir` again, including ones left by earlier runs
    async fn resync_directory(&self, output_dir: &Path) -> usize {
        let Some(sync) = &self.sync else {
            return 0;
        };

        let files = match audio_files(output_dir, &self.audio_extension) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Could not scan {}: {}", output_dir.display(), e);
                return 0;
            }
        };

        tracing::info!("Syncing {} files from {}", files.len(), output_dir.display());

        let mut synced = 0;
        for file in &files {
            if sync_logged(sync.as_ref(), file).await {
                synced += 1;
            }
        }
        synced
    }
}

/// Regular files in `dir` with the given extension, sorted by name
fn audio_files(dir: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();

    files.sort();
    Ok(files)
}
