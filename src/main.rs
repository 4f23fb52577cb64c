use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use songdl::{load_songs, utils, Cli, Config, SongDownloader};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries one line per song
    let default_filter = if cli.verbose { "songdl=debug" } else { "songdl=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(songs_file) = cli.songs_file {
        config.app.songs_file = songs_file;
    }
    if let Some(output_dir) = cli.output_dir {
        config.app.output_dir = output_dir;
    }
    if let Some(format) = cli.audio_format {
        config.audio.format = format;
    }

    let songs = load_songs(&config.app.songs_file)?;
    tracing::info!(
        "Loaded {} songs from {}",
        songs.len(),
        config.app.songs_file.display()
    );

    fs_err::create_dir_all(&config.app.output_dir)
        .context("Failed to create output directory")?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.tools).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let downloader = SongDownloader::from_config(&config, !cli.quiet)?;
    downloader.download_all(&songs, &mut std::io::stdout()).await;

    Ok(())
}
