//! songdl - A Rust CLI tool for batch-downloading songs by title
//!
//! This library resolves song names to YouTube videos, downloads them with yt-dlp
//! and extracts their audio track with ffmpeg, one song at a time.

pub mod cli;
pub mod config;
pub mod download;
pub mod media;
pub mod output;
pub mod search;
pub mod songs;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use download::{SongDownloader, SongOutcome};
pub use media::{AudioFormat, AudioTranscoder, FetchAndTranscode, MediaFetcher};
pub use search::{Resolver, SearchProvider, SearchResult};
pub use songs::load_songs;

use std::path::PathBuf;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to songdl
#[derive(thiserror::Error, Debug)]
pub enum SongdlError {
    #[error("No search results for: {0:?}")]
    NoSearchResults(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Media download failed: {0}")]
    FetchFailed(String),

    #[error("Audio extraction failed: {0}")]
    TranscodeFailed(String),

    #[error("Downloaded media has no usable file name: {0}")]
    InvalidMediaPath(PathBuf),
}
