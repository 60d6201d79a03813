use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Chat the Telegram notifier posts to when `TELEGRAM_CHAT_ID` is unset
pub const DEFAULT_CHAT_ID: &str = "5195338212";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// yt-dlp settings
    pub extractor: ExtractorConfig,

    /// Title/artist inference service
    pub inference: InferenceConfig,

    /// Remote media server target
    pub sync: SyncConfig,

    /// Telegram notification settings
    pub notify: NotifyConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Path or name of the yt-dlp binary
    pub yt_dlp_path: String,

    /// Target audio format passed to `--audio-format`
    pub audio_format: String,

    /// Encoder quality passed to `--audio-quality` (0 is best)
    pub audio_quality: String,

    /// Prefix used to turn a playlist entry id into a watch URL
    pub watch_url_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,

    /// Chat completion model
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Push finished files to the remote server
    pub enabled: bool,

    /// Path or name of the rsync binary
    pub rsync_path: String,

    /// SSH user on the remote host
    pub remote_user: String,

    /// Remote host name or address
    pub remote_host: String,

    /// Destination directory on the remote host
    pub remote_dir: String,

    /// Private key handed to ssh
    pub ssh_key_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Base URL of the Telegram Bot API
    pub api_base: String,

    /// Chat used when no override is set in the environment
    pub default_chat_id: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output directory used when `--output-dir` is not given
    pub default_output_dir: Option<PathBuf>,

    /// Delay between playlist items when `--delay` is not given
    pub default_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Self {
            extractor: ExtractorConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                audio_format: "mp3".to_string(),
                audio_quality: "0".to_string(),
                watch_url_base: "https://www.youtube.com/watch?v=".to_string(),
            },
            inference: InferenceConfig {
                api_base: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
            sync: SyncConfig {
                enabled: true,
                rsync_path: "rsync".to_string(),
                remote_user: "root".to_string(),
                remote_host: "media.local".to_string(),
                remote_dir: "/srv/media/music/".to_string(),
                ssh_key_path: home.join(".ssh").join("id_ed25519"),
            },
            notify: NotifyConfig {
                api_base: "https://api.telegram.org".to_string(),
                default_chat_id: DEFAULT_CHAT_ID.to_string(),
                timeout_secs: 10,
            },
            app: AppConfig {
                default_output_dir: None,
                default_delay_secs: 20,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tube-mirror").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extractor.yt_dlp_path.trim().is_empty() {
            anyhow::bail!("extractor.yt_dlp_path must not be empty");
        }

        if self.sync.enabled {
            if self.sync.remote_host.trim().is_empty() {
                anyhow::bail!("sync.remote_host must be configured when sync is enabled");
            }
            if self.sync.remote_dir.trim().is_empty() {
                anyhow::bail!("sync.remote_dir must be configured when sync is enabled");
            }
        }

        Ok(())
    }

    /// Output directory for a run: CLI override, then config, then `./downloads`
    pub fn output_dir(&self, cli_override: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = cli_override.or_else(|| self.app.default_output_dir.clone()) {
            return Ok(dir);
        }

        Ok(std::env::current_dir()
            .context("Could not determine working directory")?
            .join("downloads"))
    }

    /// Display current configuration
    pub fn display(&self, credentials: &Credentials) {
        println!("Current Configuration:");
        println!("  yt-dlp: {}", self.extractor.yt_dlp_path);
        println!("  Audio: {} (quality {})", self.extractor.audio_format, self.extractor.audio_quality);
        println!("  Inference: {} at {}", self.inference.model, self.inference.api_base);
        if self.sync.enabled {
            println!(
                "  Remote: {}@{}:{} (key {})",
                self.sync.remote_user,
                self.sync.remote_host,
                self.sync.remote_dir,
                self.sync.ssh_key_path.display()
            );
        } else {
            println!("  Remote: disabled");
        }
        println!("  Playlist Delay: {}s", self.app.default_delay_secs);
        println!("  OpenAI Key: {}", presence(credentials.openai_api_key.is_some()));
        println!("  Telegram Token: {}", presence(credentials.telegram_bot_token.is_some()));
        println!("  Telegram Chat: {}", credentials.chat_id(self));
    }
}

fn presence(set: bool) -> &'static str {
    if set {
        "set"
    } else {
        "not set"
    }
}

/// Secrets read from the process environment, never from the config file
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
        }
    }

    /// Chat id override, or the configured default
    pub fn chat_id(&self, config: &Config) -> String {
        self.telegram_chat_id
            .clone()
            .unwrap_or_else(|| config.notify.default_chat_id.clone())
    }
}
