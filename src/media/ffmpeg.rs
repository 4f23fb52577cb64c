use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::{AudioFormat, AudioTranscoder};
use crate::config::{AudioConfig, ToolsConfig};
use crate::{Result, SongdlError};

/// Audio extraction backed by ffmpeg
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    format: AudioFormat,
    bitrate: Option<String>,
    sample_rate: u32,
}

impl FfmpegTranscoder {
    pub fn new(tools: &ToolsConfig, audio: &AudioConfig) -> Self {
        Self {
            ffmpeg_path: tools.ffmpeg_path.clone(),
            format: audio.format,
            bitrate: audio.bitrate.clone(),
            sample_rate: audio.sample_rate,
        }
    }

    fn transcode_args(&self, video: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-vn".to_string(), // No video
            "-acodec".to_string(),
            self.format.codec().to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
        ];

        if let Some(bitrate) = self.bitrate.as_ref().filter(|_| !self.format.is_lossless()) {
            args.push("-b:a".to_string());
            args.push(bitrate.clone());
        }

        args.push("-y".to_string()); // Overwrite output file
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<()> {
        tracing::debug!("Extracting {} audio from {}", self.format, video.display());

        let result = Command::new(&self.ffmpeg_path)
            .args(self.transcode_args(video, output))
            .output()
            .await
            .map_err(|e| SongdlError::TranscodeFailed(format!("could not run {}: {}", self.ffmpeg_path, e)))?;

        if !result.status.success() {
            let error = String::from_utf8_lossy(&result.stderr);
            return Err(SongdlError::TranscodeFailed(error.trim().to_string()).into());
        }

        Ok(())
    }
}
