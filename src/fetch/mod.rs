use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use crate::{ClipError, ClipResult};

/// A full-length audio track downloaded to local disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedAudio {
    /// Local path of the downloaded file
    pub path: PathBuf,

    /// Track length in seconds, when it could be determined
    pub duration: Option<f64>,

    /// Identifier of the media at its source (the video id for YouTube)
    pub source_id: String,

    /// Title of the media
    pub title: Option<String>,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "aac" => Some(AudioFormat::M4a),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// ffmpeg audio encoder for this format
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::M4a => "aac",
            AudioFormat::Wav => "pcm_s16le",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "libvorbis",
        }
    }

    /// ffmpeg muxer name, for outputs whose extension does not imply one
    pub fn ffmpeg_muxer(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "ipod",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// Whether a bitrate applies to the encoder
    pub fn is_lossy(&self) -> bool {
        matches!(self, AudioFormat::Mp3 | AudioFormat::M4a | AudioFormat::Ogg)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieves the audio track of a remote source to local disk
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download the best available audio of `url` into `dest_dir`
    async fn fetch(&self, url: &str, dest_dir: &Path) -> ClipResult<FetchedAudio>;

    /// Name of the backing tool, for log lines
    fn name(&self) -> &'static str;
}

const UNAVAILABLE_MARKERS: &[&str] = &[
    "video unavailable",
    "private video",
    "this video is private",
    "has been removed",
    "no longer available",
    "available in your country",
    "geo restrict",
    "members-only",
    "join this channel",
    "sign in to confirm your age",
    "account associated with this video has been terminated",
    "http error 404",
    "http error 410",
];

const NETWORK_MARKERS: &[&str] = &[
    "unable to download webpage",
    "timed out",
    "connection reset",
    "connection refused",
    "connection aborted",
    "temporary failure in name resolution",
    "name or service not known",
    "nodename nor servname provided",
    "network is unreachable",
    "getaddrinfo failed",
    "urlopen error",
    "http error 500",
    "http error 502",
    "http error 503",
    "http error 504",
];

/// Map a downloader's error output onto a fetch failure category.
///
/// Unrecognised output is reported as an unresolvable source.
pub fn classify_failure(url: &str, stderr: &str) -> ClipError {
    let lowered = stderr.to_lowercase();
    let reason = summarize_stderr(stderr);
    let url = url.to_string();

    if UNAVAILABLE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ClipError::SourceUnavailable { url, reason }
    } else if NETWORK_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ClipError::NetworkFailure { url, reason }
    } else {
        ClipError::UnresolvableSource { url, reason }
    }
}

/// Last `ERROR:` line of the output, or its last non-empty line
fn summarize_stderr(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "no error output".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.youtube.com/watch?v=abc";

    #[test]
    fn test_classify_unavailable() {
        let err = classify_failure(
            URL,
            "WARNING: something\nERROR: [youtube] abc: Private video. Sign in if you've been granted access",
        );
        match err {
            ClipError::SourceUnavailable { reason, .. } => {
                assert!(reason.starts_with("[youtube] abc: Private video"));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            classify_failure(URL, "ERROR: [youtube] abc: Video unavailable"),
            ClipError::SourceUnavailable { .. }
        ));
        assert!(matches!(
            classify_failure(
                URL,
                "ERROR: The uploader has not made this video available in your country"
            ),
            ClipError::SourceUnavailable { .. }
        ));
    }

    #[test]
    fn test_classify_network() {
        assert!(matches!(
            classify_failure(
                URL,
                "ERROR: [youtube] abc: Unable to download webpage: <urlopen error [Errno -3] Temporary failure in name resolution>"
            ),
            ClipError::NetworkFailure { .. }
        ));
        assert!(matches!(
            classify_failure(URL, "ERROR: Read timed out."),
            ClipError::NetworkFailure { .. }
        ));
    }

    #[test]
    fn test_classify_unresolvable_is_fallback() {
        assert!(matches!(
            classify_failure(
                "https://example.com/page",
                "ERROR: Unsupported URL: https://example.com/page"
            ),
            ClipError::UnresolvableSource { .. }
        ));
        assert!(matches!(
            classify_failure(URL, ""),
            ClipError::UnresolvableSource { reason, .. } if reason == "no error output"
        ));
    }

    #[test]
    fn test_audio_format_from_path() {
        assert_eq!(AudioFormat::from_path(Path::new("clip.MP3")), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_path(Path::new("a/b/clip.aac")), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_path(Path::new("clip.txt")), None);
        assert_eq!(AudioFormat::from_path(Path::new("clip")), None);
        assert!(!AudioFormat::Flac.is_lossy());
        assert_eq!(AudioFormat::Ogg.ffmpeg_codec(), "libvorbis");
    }
}
