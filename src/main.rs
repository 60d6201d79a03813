use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tube_mirror::cli::{is_playlist_url, Cli, Commands};
use tube_mirror::config::{Config, Credentials};
use tube_mirror::pipeline::{Pipeline, RunOptions};
use tube_mirror::utils::{self, ToolCheck};

fn init_tracing(verbose: bool, json: bool) {
    // The library logs under `tube_mirror`, this binary under `tubemirror`
    let default_filter = if verbose {
        "tube_mirror=debug,tubemirror=debug"
    } else {
        "tube_mirror=info,tubemirror=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let config = Config::load().await?;
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Download {
            url,
            output_dir,
            delay,
            no_sync,
            no_notify,
        } => {
            let url = utils::validate_and_normalize_url(&url)?;

            let warnings = utils::check_dependencies(ToolCheck {
                yt_dlp: &config.extractor.yt_dlp_path,
                rsync: &config.sync.rsync_path,
                check_rsync: config.sync.enabled && !no_sync,
            })
            .await?;
            for warning in warnings {
                tracing::warn!("Missing dependency: {}", warning);
            }

            let output_dir = config.output_dir(output_dir)?;
            let options = RunOptions {
                sync: !no_sync,
                notify: !no_notify,
                show_progress: !cli.quiet,
            };
            let pipeline = Pipeline::new(&config, &credentials, options)?;

            if is_playlist_url(&url) {
                tracing::info!("Detected playlist URL");
                let delay = delay.unwrap_or(config.app.default_delay_secs);
                let report = pipeline.run_playlist(&url, &output_dir, delay).await;

                if report.completed {
                    println!(
                        "{} {}/{} items downloaded to {}",
                        style("Playlist complete:").green().bold(),
                        report.succeeded,
                        report.total,
                        output_dir.display()
                    );
                    if report.failed > 0 {
                        println!("{} {} items failed", style("Warning:").yellow(), report.failed);
                    }
                } else {
                    println!("{} no items were processed", style("Playlist failed:").red().bold());
                }
            } else {
                tracing::info!("Detected single video URL");
                let report = pipeline.process_item(&url, &output_dir, true).await;

                match (&report.path, report.succeeded()) {
                    (Some(path), true) => {
                        println!("{} {}", style("Audio saved to:").green().bold(), path.display())
                    }
                    _ => println!("{} {}", style("Download failed:").red().bold(), url),
                }
            }
        }
        Commands::Config { show } => {
            if show {
                config.display(&credentials);
            } else {
                println!("Configuration file:");
                println!("  {}", Config::config_path()?.display());
                println!("Secrets are read from OPENAI_API_KEY, TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID.");
            }
        }
    }

    Ok(())
}
