use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::media::ffmpeg::FfmpegTranscoder;
use crate::media::ytdlp::YtDlpFetcher;
use crate::media::FetchAndTranscode;
use crate::search::youtube::YoutubeSearch;
use crate::search::Resolver;
use crate::{output, utils, Result};

/// What happened to one entry of the song list
#[derive(Debug)]
pub struct SongOutcome {
    /// The song name exactly as read from the list
    pub song: String,

    /// Path of the audio file written, or why the song was skipped
    pub result: Result<PathBuf>,
}

impl SongOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Sequential batch downloader: resolve, fetch and transcode one song at a time
pub struct SongDownloader {
    resolver: Resolver,
    fetch_and_transcode: FetchAndTranscode,
    output_dir: PathBuf,
    show_progress: bool,
}

impl SongDownloader {
    pub fn new(
        resolver: Resolver,
        fetch_and_transcode: FetchAndTranscode,
        output_dir: PathBuf,
        show_progress: bool,
    ) -> Self {
        Self {
            resolver,
            fetch_and_transcode,
            output_dir,
            show_progress,
        }
    }

    /// Build a downloader using YouTube search, yt-dlp and ffmpeg as configured
    pub fn from_config(config: &Config, show_progress: bool) -> Result<Self> {
        let search = YoutubeSearch::new(&config.search)
            .context("Failed to create search client")?;
        let resolver = Resolver::new(Box::new(search), config.search.base_url.clone());

        let fetch_and_transcode = FetchAndTranscode::new(
            Box::new(YtDlpFetcher::new(&config.tools)),
            Box::new(FfmpegTranscoder::new(&config.tools, &config.audio)),
            config.audio.format,
            config.app.temp_dir.clone(),
        );

        Ok(Self::new(
            resolver,
            fetch_and_transcode,
            config.app.output_dir.clone(),
            show_progress,
        ))
    }

    /// Process every song in order, writing one line per song to `out` as it finishes.
    ///
    /// A failing song never stops the batch.
    pub async fn download_all<W: Write>(&self, songs: &[String], out: &mut W) -> Vec<SongOutcome> {
        let mut outcomes = Vec::with_capacity(songs.len());

        for song in songs {
            let progress = self.spinner(song);
            let started = Instant::now();

            let result = self.download_song(song).await;
            progress.finish_and_clear();

            match &result {
                Ok(path) => tracing::info!(
                    "Saved {:?} to {} in {}",
                    song,
                    path.display(),
                    utils::format_duration(started.elapsed())
                ),
                Err(e) => tracing::info!("Skipping {:?}: {:#}", song, e),
            }

            let outcome = SongOutcome {
                song: song.clone(),
                result,
            };
            if let Err(e) = output::write_outcome(out, &outcome) {
                tracing::warn!("Failed to report result for {:?}: {}", song, e);
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Resolve a single song and save its audio
    pub async fn download_song(&self, song: &str) -> Result<PathBuf> {
        let url = self.resolver.resolve(song).await?;
        self.fetch_and_transcode.run(&url, &self.output_dir).await
    }

    fn spinner(&self, song: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            progress.set_style(style);
        }
        progress.set_message(format!("Downloading {}...", song));
        progress.enable_steady_tick(Duration::from_millis(120));
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{AudioFormat, MockAudioTranscoder, MockMediaFetcher};
    use crate::search::{MockSearchProvider, SearchResult};
    use crate::SongdlError;
    use mockall::Sequence;

    fn hit(id: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            title: None,
            channel: None,
            duration: None,
            views: None,
            url_suffix: format!("/watch?v={}", id),
        }
    }

    /// Fetcher that writes `<video id>.mp4`, and a transcoder that writes the audio file
    fn media_mocks(expected_fetches: usize) -> (MockMediaFetcher, MockAudioTranscoder) {
        let mut fetcher = MockMediaFetcher::new();
        fetcher
            .expect_fetch()
            .times(expected_fetches)
            .returning(|url, dir| {
                let id = url.rsplit('=').next().unwrap();
                let video = dir.join(format!("{}.mp4", id));
                std::fs::write(&video, b"video").unwrap();
                Ok(video)
            });

        let mut transcoder = MockAudioTranscoder::new();
        transcoder
            .expect_extract_audio()
            .times(expected_fetches)
            .returning(|_, output| {
                std::fs::write(output, b"audio").unwrap();
                Ok(())
            });

        (fetcher, transcoder)
    }

    fn downloader(
        provider: MockSearchProvider,
        fetcher: MockMediaFetcher,
        transcoder: MockAudioTranscoder,
        output_dir: PathBuf,
    ) -> SongDownloader {
        SongDownloader::new(
            Resolver::new(Box::new(provider), "https://www.youtube.com"),
            FetchAndTranscode::new(Box::new(fetcher), Box::new(transcoder), AudioFormat::Mp3, None),
            output_dir,
            false,
        )
    }

    fn songs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_downloads_every_song_in_order() {
        let output = tempfile::tempdir().unwrap();
        let mut seq = Sequence::new();

        let mut provider = MockSearchProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider
            .expect_search()
            .withf(|query| query == "Bohemian Rhapsody")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![hit("bohemian")]));
        provider
            .expect_search()
            .withf(|query| query == "Imagine")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![hit("imagine")]));

        let (fetcher, transcoder) = media_mocks(2);
        let downloader = downloader(provider, fetcher, transcoder, output.path().to_path_buf());

        let outcomes = downloader
            .download_all(&songs(&["Bohemian Rhapsody", "Imagine"]), &mut std::io::sink())
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].song, "Bohemian Rhapsody");
        assert_eq!(outcomes[1].song, "Imagine");
        assert!(outcomes.iter().all(SongOutcome::is_success));
        assert!(output.path().join("bohemian.mp3").exists());
        assert!(output.path().join("imagine.mp3").exists());
    }

    #[tokio::test]
    async fn test_unresolved_song_is_skipped_without_fetching() {
        let output = tempfile::tempdir().unwrap();

        let mut provider = MockSearchProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider
            .expect_search()
            .withf(|query| query == "zzzz no such song")
            .times(1)
            .returning(|_| Ok(Vec::new()));
        provider
            .expect_search()
            .withf(|query| query == "Imagine")
            .times(1)
            .returning(|_| Ok(vec![hit("imagine")]));

        // Only the second song reaches the fetcher
        let (fetcher, transcoder) = media_mocks(1);
        let downloader = downloader(provider, fetcher, transcoder, output.path().to_path_buf());

        let outcomes = downloader
            .download_all(&songs(&["zzzz no such song", "Imagine"]), &mut std::io::sink())
            .await;

        assert!(!outcomes[0].is_success());
        let err = outcomes[0].result.as_ref().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SongdlError>(),
            Some(SongdlError::NoSearchResults(_))
        ));
        assert!(outcomes[1].is_success());
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_stop_the_batch() {
        let output = tempfile::tempdir().unwrap();

        let mut provider = MockSearchProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider
            .expect_search()
            .times(2)
            .returning(|query| Ok(vec![hit(&query.replace(' ', "_"))]));

        let mut fetcher = MockMediaFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_, _| Err(SongdlError::FetchFailed("Video unavailable".to_string()).into()));

        let mut transcoder = MockAudioTranscoder::new();
        transcoder.expect_extract_audio().never();

        let downloader = downloader(provider, fetcher, transcoder, output.path().to_path_buf());
        let outcomes = downloader
            .download_all(&songs(&["Song A", "Song B"]), &mut std::io::sink())
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|outcome| !outcome.is_success()));
    }

    #[tokio::test]
    async fn test_blank_line_reaches_the_resolver() {
        let output = tempfile::tempdir().unwrap();

        let mut provider = MockSearchProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider
            .expect_search()
            .withf(|query| query.is_empty())
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_fetch().never();
        let mut transcoder = MockAudioTranscoder::new();
        transcoder.expect_extract_audio().never();

        let downloader = downloader(provider, fetcher, transcoder, output.path().to_path_buf());
        let outcomes = downloader.download_all(&songs(&[""]), &mut std::io::sink()).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].song, "");
        assert!(!outcomes[0].is_success());
    }

    #[tokio::test]
    async fn test_reports_one_line_per_song_in_order() {
        let output = tempfile::tempdir().unwrap();

        let mut provider = MockSearchProvider::new();
        provider.expect_provider_name().return_const("mock");
        provider
            .expect_search()
            .withf(|query| query == "Bohemian Rhapsody")
            .returning(|_| Ok(vec![hit("bohemian")]));
        provider
            .expect_search()
            .withf(|query| query == "zzzz no such song")
            .returning(|_| Ok(Vec::new()));
        provider
            .expect_search()
            .withf(|query| query == "Imagine")
            .returning(|_| Ok(vec![hit("imagine")]));

        let (fetcher, transcoder) = media_mocks(2);
        let downloader = downloader(provider, fetcher, transcoder, output.path().to_path_buf());

        let mut out = Vec::new();
        downloader
            .download_all(&songs(&["Bohemian Rhapsody", "zzzz no such song", "Imagine"]), &mut out)
            .await;

        let printed = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Successfully download song: Bohemian Rhapsody");
        assert!(lines[1].starts_with("Can't download song: zzzz no such song with error: No search results"));
        assert!(lines[1].ends_with(", continue to next song"));
        assert_eq!(lines[2], "Successfully download song: Imagine");
    }
}
