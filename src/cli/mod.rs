use clap::Parser;
use std::path::PathBuf;

use crate::media::AudioFormat;

#[derive(Parser, Debug)]
#[command(
    name = "songdl",
    about = "songdl - Download songs from YouTube by name and keep only their audio",
    version,
    long_about = "Reads a list of song names (one per line), looks each one up on YouTube, downloads the first match with yt-dlp and extracts its audio track with ffmpeg. Failures are reported per song and never stop the batch."
)]
pub struct Cli {
    /// The path to the file that contains the songs (defaults to songs.txt)
    #[arg(
        short = 'f',
        long = "songs-file-path",
        visible_alias = "songs_file_path",
        value_name = "FILE"
    )]
    pub songs_file: Option<PathBuf>,

    /// The directory that will contain the downloaded songs (defaults to the current directory)
    #[arg(
        short = 'd',
        long = "dir-path",
        visible_alias = "dir_path",
        value_name = "DIR"
    )]
    pub output_dir: Option<PathBuf>,

    /// Audio format of the written files (overrides the config file)
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub audio_format: Option<AudioFormat>,

    /// Configuration file to use instead of the default lookup
    #[arg(short, long, value_name = "FILE", env = "SONGDL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}
