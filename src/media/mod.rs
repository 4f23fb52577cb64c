use anyhow::Context;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod ffmpeg;
pub mod ytdlp;

use crate::{Result, SongdlError};

/// Supported output audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG layer 3 (libmp3lame)
    Mp3,
    /// AAC in an MP4 container
    M4a,
    /// Ogg Vorbis
    Ogg,
    /// Lossless FLAC
    Flac,
    /// 16-bit PCM WAV
    Wav,
}

impl AudioFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "wav",
        }
    }

    /// ffmpeg encoder name for the format
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::M4a => "aac",
            AudioFormat::Ogg => "libvorbis",
            AudioFormat::Flac => "flac",
            AudioFormat::Wav => "pcm_s16le",
        }
    }

    /// Lossless formats ignore a configured bitrate
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioFormat::Flac | AudioFormat::Wav)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Trait for downloading the media behind a video URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the best combined audio/video stream into `dir` and return the file written
    async fn fetch(&self, url: &str, dir: &Path) -> Result<PathBuf>;
}

/// Trait for pulling the audio track out of a video file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    /// Extract and encode the audio of `video` into `output`
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()>;
}

/// Download a video, keep its audio in the output directory and drop the video
pub struct FetchAndTranscode {
    fetcher: Box<dyn MediaFetcher>,
    transcoder: Box<dyn AudioTranscoder>,
    format: AudioFormat,
    temp_root: Option<PathBuf>,
}

impl FetchAndTranscode {
    pub fn new(
        fetcher: Box<dyn MediaFetcher>,
        transcoder: Box<dyn AudioTranscoder>,
        format: AudioFormat,
        temp_root: Option<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            transcoder,
            format,
            temp_root,
        }
    }

    /// Run the whole step for one resolved URL, returning the audio file written.
    ///
    /// The video and the encoded audio both land in a per-song temporary
    /// directory; the audio is moved into `output_dir` only once encoding has
    /// succeeded, so a failed song never touches files already there. The
    /// directory is removed when its guard drops.
    pub async fn run(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        let work_dir = self.work_dir()?;

        let video = self.fetcher.fetch(url, work_dir.path()).await?;
        tracing::debug!("Downloaded {} to {}", url, video.display());

        let audio = audio_output_path(&video, output_dir, self.format)?;

        let staging = work_dir.path().join("songdl-staging");
        fs_err::create_dir(&staging)?;
        let staged = audio_output_path(&video, &staging, self.format)?;

        self.transcoder.extract_audio(&video, &staged).await?;
        move_file(&staged, &audio).context("Failed to move audio into the output directory")?;

        // The audio is in place; leftovers only cost disk space
        if let Err(e) = fs_err::remove_file(&video) {
            tracing::warn!("Failed to remove downloaded video: {}", e);
        }
        if let Err(e) = work_dir.close() {
            tracing::warn!("Failed to remove temporary directory: {}", e);
        }

        Ok(audio)
    }

    fn work_dir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("songdl-");

        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };

        dir.context("Failed to create temporary directory")
    }
}

/// Rename, falling back to copy and delete when `to` is on another filesystem
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs_err::rename(from, to).is_ok() {
        return Ok(());
    }

    fs_err::copy(from, to)?;
    fs_err::remove_file(from)
}

/// Audio destination for a downloaded video: its file stem with the audio extension, inside `output_dir`
pub fn audio_output_path(video: &Path, output_dir: &Path, format: AudioFormat) -> Result<PathBuf> {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SongdlError::InvalidMediaPath(video.to_path_buf()))?;

    // Not `with_extension`: titles such as "Mr. Blue Sky" contain dots
    Ok(output_dir.join(format!("{}.{}", stem, format.extension())))
}
