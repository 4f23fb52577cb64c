use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::MediaFetcher;
use crate::config::ToolsConfig;
use crate::{Result, SongdlError};

/// Video downloader backed by yt-dlp
pub struct YtDlpFetcher {
    yt_dlp_path: String,
    video_format: String,
}

impl YtDlpFetcher {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            yt_dlp_path: tools.yt_dlp_path.clone(),
            video_format: tools.video_format.clone(),
        }
    }

    fn download_args(&self, url: &str, dir: &Path) -> Vec<String> {
        let template = dir.join("%(title)s.%(ext)s");

        vec![
            "--format".to_string(),
            self.video_format.clone(),
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            // Report where the finished file ended up
            "--print".to_string(),
            "after_move:filepath".to_string(),
            "--no-simulate".to_string(),
            url.to_string(),
        ]
    }
}

/// Pick the downloaded file: the path yt-dlp printed, or the only file left in `dir`
fn locate_download(stdout: &str, dir: &Path) -> Result<PathBuf> {
    let printed = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
        .filter(|path| path.is_file());

    if let Some(path) = printed {
        return Ok(path);
    }

    let mut files = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file());

    match (files.next(), files.next()) {
        (Some(path), None) => Ok(path),
        (None, _) => Err(SongdlError::FetchFailed("yt-dlp did not produce a file".to_string()).into()),
        (Some(_), Some(_)) => Err(SongdlError::FetchFailed(
            "yt-dlp left several files behind".to_string(),
        )
        .into()),
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        tracing::debug!("Downloading video with yt-dlp: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(self.download_args(url, dir))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SongdlError::FetchFailed(format!("could not run {}: {}", self.yt_dlp_path, e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(SongdlError::FetchFailed(error.trim().to_string()).into());
        }

        locate_download(&String::from_utf8_lossy(&output.stdout), dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_args() {
        let fetcher = YtDlpFetcher::new(&ToolsConfig::default());
        let args = fetcher.download_args("https://www.youtube.com/watch?v=abc", Path::new("/tmp/work"));

        assert_eq!(args[0], "--format");
        assert_eq!(args[1], "best");
        assert!(args.contains(&"/tmp/work/%(title)s.%(ext)s".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn test_locate_printed_path() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("Imagine.mp4");
        fs_err::write(&video, b"video").unwrap();

        let stdout = format!("{}\n", video.display());
        assert_eq!(locate_download(&stdout, dir.path()).unwrap(), video);
    }

    #[test]
    fn test_locate_falls_back_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("Imagine.webm");
        fs_err::write(&video, b"video").unwrap();

        assert_eq!(locate_download("", dir.path()).unwrap(), video);
    }

    #[test]
    fn test_locate_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(locate_download("", dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_fetch_error() {
        let tools = ToolsConfig {
            yt_dlp_path: "songdl-no-such-yt-dlp".to_string(),
            ..ToolsConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();

        let err = YtDlpFetcher::new(&tools)
            .fetch("https://www.youtube.com/watch?v=abc", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<SongdlError>(), Some(SongdlError::FetchFailed(_))));
    }
}
