use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::media::AudioFormat;
use crate::utils;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Search provider settings
    pub search: SearchConfig,

    /// External tool locations
    pub tools: ToolsConfig,

    /// Audio output settings
    pub audio: AudioConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page queried with `?search_query=<name>`
    pub results_url: String,

    /// Prefix joined with the result's path suffix to form the video URL
    pub base_url: String,

    /// User agent sent with search requests
    pub user_agent: String,

    /// Value of the Accept-Language header
    pub accept_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp_path: String,

    pub ffmpeg_path: String,

    /// yt-dlp format selector; `best` is the best single file carrying both audio and video
    pub video_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output audio format
    pub format: AudioFormat,

    /// Encoder bitrate such as `192k` (encoder default if not set)
    pub bitrate: Option<String>,

    /// Output sample rate in Hz
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Song list used when no path is given on the command line
    pub songs_file: PathBuf,

    /// Output directory used when none is given on the command line
    pub output_dir: PathBuf,

    /// Parent for per-song temporary directories (system temp dir if not set)
    pub temp_dir: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_url: "https://www.youtube.com/results".to_string(),
            base_url: "https://www.youtube.com".to_string(),
            user_agent: concat!("songdl/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_language: "en".to_string(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            video_format: "best".to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::Mp3,
            bitrate: None,
            sample_rate: 44100,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            songs_file: PathBuf::from("songs.txt"),
            output_dir: PathBuf::from("."),
            temp_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, the default locations, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                utils::check_file_accessible(path).context("Config file is not usable")?;
                Some(path.to_path_buf())
            }
            None => Self::config_path().filter(|path| path.exists()),
        };

        let config = match config_path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path)
                    .context("Failed to read config file")?;
                Self::from_yaml(&content)?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML; missing keys take their default values
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // Current directory wins so a project can carry its own settings
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("songdl").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        utils::validate_url(&self.search.results_url)
            .context("search.results_url is invalid")?;
        utils::validate_url(&self.search.base_url)
            .context("search.base_url is invalid")?;

        if self.audio.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be greater than zero");
        }
        if self.tools.yt_dlp_path.is_empty() || self.tools.ffmpeg_path.is_empty() {
            anyhow::bail!("tools.yt_dlp_path and tools.ffmpeg_path must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search.base_url, "https://www.youtube.com");
        assert_eq!(config.app.songs_file, PathBuf::from("songs.txt"));
        assert_eq!(config.app.output_dir, PathBuf::from("."));
        assert_eq!(config.audio.format, AudioFormat::Mp3);
        assert_eq!(config.tools.video_format, "best");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("audio:\n  format: flac\n  bitrate: 320k\n").unwrap();
        assert_eq!(config.audio.format, AudioFormat::Flac);
        assert_eq!(config.audio.bitrate.as_deref(), Some("320k"));
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.tools.yt_dlp_path, "yt-dlp");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.search.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audio.sample_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songdl.yaml");
        fs_err::write(&path, "app:\n  output_dir: /tmp/music\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.app.output_dir, PathBuf::from("/tmp/music"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }
}
