use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::fetch::AudioFormat;

const EXAMPLES: &str = "\
Examples:
  yt-trim \"https://youtube.com/watch?v=dQw4w9WgXcQ\" 0:30 2:15
  yt-trim \"https://youtube.com/watch?v=dQw4w9WgXcQ\" 30 135 --output my_clip.mp3
  yt-trim \"https://youtube.com/watch?v=dQw4w9WgXcQ\" 1:30:45 1:33:20 --keep-temp

Time formats: HH:MM:SS, MM:SS or SS (seconds may carry a fraction, e.g. 12.5)";

#[derive(Parser, Debug)]
#[command(
    name = "yt-trim",
    about = "Download the audio of an online video and trim it to a time window",
    version,
    long_about = "Downloads the best available audio track of a video with yt-dlp, cuts the requested [START, END) window out of it with ffmpeg, and removes the full-length download afterwards.",
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Video URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Start of the window (HH:MM:SS, MM:SS or SS)
    #[arg(value_name = "START", allow_negative_numbers = true)]
    pub start: String,

    /// End of the window (HH:MM:SS, MM:SS or SS)
    #[arg(value_name = "END", allow_negative_numbers = true)]
    pub end: String,

    /// Output file (default: derived from the video and the window)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for derived output file names
    #[arg(
        short = 'd',
        long,
        value_name = "DIR",
        env = "YT_TRIM_OUTPUT_DIR",
        conflicts_with = "output"
    )]
    pub output_dir: Option<PathBuf>,

    /// Keep the full-length download after trimming
    #[arg(long)]
    pub keep_temp: bool,

    /// Output audio format when the output file has no recognised extension
    #[arg(short, long, value_enum, default_value = "mp3")]
    pub format: AudioFormat,

    /// Bitrate for lossy output formats
    #[arg(short, long, value_name = "RATE", env = "YT_TRIM_BITRATE", default_value = "192k")]
    pub bitrate: String,

    /// Directory for the full-length download
    #[arg(long, value_name = "DIR", env = "YT_TRIM_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// yt-dlp executable
    #[arg(long, value_name = "PATH", env = "YT_TRIM_YT_DLP", default_value = "yt-dlp")]
    pub yt_dlp: String,

    /// ffmpeg executable
    #[arg(long, value_name = "PATH", env = "YT_TRIM_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// ffprobe executable
    #[arg(long, value_name = "PATH", env = "YT_TRIM_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: String,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable progress indicators and informational logging
    #[arg(short, long)]
    pub quiet: bool,

    /// Log line encoding
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}
