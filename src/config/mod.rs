use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Cli;
use crate::fetch::AudioFormat;
use crate::{ClipError, ClipResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External tool locations
    pub tools: ToolConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub yt_dlp: String,
    pub ffmpeg: String,
    pub ffprobe: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where full-length downloads are written
    pub temp_dir: PathBuf,

    /// Directory for derived output names; empty means the current directory
    pub output_dir: PathBuf,

    /// Output format when the output path does not name one
    pub audio_format: AudioFormat,

    /// Bitrate for lossy output formats
    pub bitrate: String,

    /// Show spinners while the external tools run
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolConfig {
                yt_dlp: "yt-dlp".to_string(),
                ffmpeg: "ffmpeg".to_string(),
                ffprobe: "ffprobe".to_string(),
            },
            app: AppConfig {
                temp_dir: std::env::temp_dir().join("yt-trim"),
                output_dir: PathBuf::new(),
                audio_format: AudioFormat::Mp3,
                bitrate: "192k".to_string(),
                show_progress: true,
            },
        }
    }
}

impl Config {
    /// Build the configuration from parsed arguments (environment already applied by clap)
    pub fn from_cli(cli: &Cli) -> ClipResult<Self> {
        let defaults = Self::default();

        let config = Self {
            tools: ToolConfig {
                yt_dlp: cli.yt_dlp.clone(),
                ffmpeg: cli.ffmpeg.clone(),
                ffprobe: cli.ffprobe.clone(),
            },
            app: AppConfig {
                temp_dir: cli.temp_dir.clone().unwrap_or(defaults.app.temp_dir),
                output_dir: cli.output_dir.clone().unwrap_or(defaults.app.output_dir),
                audio_format: cli.format,
                bitrate: cli.bitrate.trim().to_lowercase(),
                show_progress: !cli.quiet,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ClipResult<()> {
        let tools = [
            ("yt-dlp", &self.tools.yt_dlp),
            ("ffmpeg", &self.tools.ffmpeg),
            ("ffprobe", &self.tools.ffprobe),
        ];
        for (name, path) in tools {
            if path.trim().is_empty() {
                return Err(ClipError::InvalidConfig(format!("{} path is empty", name)));
            }
        }

        if !is_valid_bitrate(&self.app.bitrate) {
            return Err(ClipError::InvalidConfig(format!(
                "bitrate '{}' must look like 192k",
                self.app.bitrate
            )));
        }

        if self.app.temp_dir.is_file() {
            return Err(ClipError::InvalidConfig(format!(
                "temp dir {} is a file",
                self.app.temp_dir.display()
            )));
        }

        if self.app.output_dir.is_file() {
            return Err(ClipError::InvalidConfig(format!(
                "output dir {} is a file",
                self.app.output_dir.display()
            )));
        }

        Ok(())
    }
}

fn is_valid_bitrate(bitrate: &str) -> bool {
    bitrate.strip_suffix('k').is_some_and(|digits| {
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && digits != "0"
    })
}
