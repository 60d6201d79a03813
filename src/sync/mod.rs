use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::config::SyncConfig;
use crate::{Result, TubeMirrorError};

/// Result of one transfer, kept for logging only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Pushes finished files to the remote media server
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileSync: Send + Sync {
    /// Transfer one file. `Err` means the transfer could not be started at all.
    async fn sync(&self, path: &Path) -> Result<SyncOutcome>;
}

/// Remote sync through rsync over ssh with a fixed key
pub struct RsyncSync {
    rsync_path: String,
    ssh_key_path: PathBuf,
    destination: String,
}

impl RsyncSync {
    pub fn new(config: &SyncConfig) -> Self {
        let destination = if config.remote_user.is_empty() {
            format!("{}:{}", config.remote_host, config.remote_dir)
        } else {
            format!("{}@{}:{}", config.remote_user, config.remote_host, config.remote_dir)
        };

        Self {
            rsync_path: config.rsync_path.clone(),
            ssh_key_path: config.ssh_key_path.clone(),
            destination,
        }
    }

    /// Arguments for one transfer
    fn build_args(&self, path: &Path) -> Vec<String> {
        vec![
            "-avz".to_string(),
            "--partial".to_string(),
            "-e".to_string(),
            format!(
                "ssh -i {} -o BatchMode=yes -o StrictHostKeyChecking=accept-new",
                self.ssh_key_path.display()
            ),
            path.to_string_lossy().into_owned(),
            self.destination.clone(),
        ]
    }
}

#[async_trait]
impl FileSync for RsyncSync {
    async fn sync(&self, path: &Path) -> Result<SyncOutcome> {
        tracing::info!("Syncing {} to {}", path.display(), self.destination);

        let output = Command::new(&self.rsync_path)
            .args(self.build_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TubeMirrorError::SyncFailed(format!("failed to launch {}: {}", self.rsync_path, e)))?;

        let outcome = SyncOutcome {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if outcome.success {
            tracing::debug!("rsync output: {}", outcome.stdout.trim());
        } else {
            tracing::error!(
                "rsync exited with {} for {}: {}",
                output.status,
                path.display(),
                outcome.stderr.trim()
            );
        }

        Ok(outcome)
    }
}

/// Run a sync and collapse every failure into `false`, logging the cause
pub async fn sync_logged(sync: &dyn FileSync, path: &Path) -> bool {
    match sync.sync(path).await {
        Ok(outcome) => outcome.success,
        Err(e) => {
            tracing::error!("Sync of {} failed: {:#}", path.display(), e);
            false
        }
    }
}
