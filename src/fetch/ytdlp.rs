use async_trait::async_trait;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use uuid::Uuid;

use super::{classify_failure, AudioFormat, FetchedAudio, MediaFetcher};
use crate::{utils, ClipError, ClipResult};

/// Format selector handed to yt-dlp
const FORMAT_SELECTOR: &str = "bestaudio/best";

/// Metadata fields read from `yt-dlp --dump-json`
#[derive(Debug, Deserialize)]
struct VideoInfo {
    id: String,
    title: Option<String>,
    duration: Option<f64>,
}

/// Audio fetcher backed by yt-dlp
pub struct YtDlpFetcher {
    yt_dlp_path: String,
    ffprobe_path: String,
    audio_format: AudioFormat,
    audio_quality: String,
}

impl YtDlpFetcher {
    pub fn new(yt_dlp_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            ffprobe_path: ffprobe_path.into(),
            audio_format: AudioFormat::Mp3,
            audio_quality: "192K".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        utils::check_command_available(&self.yt_dlp_path).await
    }

    async fn run(&self, args: &[&str]) -> ClipResult<Output> {
        Command::new(&self.yt_dlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ClipError::ToolNotFound {
                    tool: self.yt_dlp_path.clone(),
                },
                _ => ClipError::UnresolvableSource {
                    url: args.last().copied().unwrap_or_default().to_string(),
                    reason: format!("failed to run {}: {}", self.yt_dlp_path, e),
                },
            })
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, url: &str) -> ClipResult<VideoInfo> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = self
            .run(&["--dump-json", "--no-playlist", "--no-warnings", url])
            .await?;

        if !output.status.success() {
            return Err(classify_failure(url, &String::from_utf8_lossy(&output.stderr)));
        }

        // A single video prints one JSON document per line
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first = stdout.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
        serde_json::from_str(first).map_err(|e| ClipError::UnresolvableSource {
            url: url.to_string(),
            reason: format!("unreadable metadata from yt-dlp: {}", e),
        })
    }

    /// Download the audio track as `<dest_dir>/<stem>.<format>`
    async fn download(&self, url: &str, dest_dir: &Path, stem: &str) -> ClipResult<PathBuf> {
        let template = dest_dir.join(format!("{}.%(ext)s", stem));
        let template = template.to_string_lossy();

        tracing::debug!("Downloading audio for {} to {}", url, template);

        let output = self
            .run(&[
                "--format",
                FORMAT_SELECTOR,
                "--extract-audio",
                "--audio-format",
                self.audio_format.as_str(),
                "--audio-quality",
                self.audio_quality.as_str(),
                "--no-playlist",
                "--no-progress",
                "--output",
                &*template,
                url,
            ])
            .await?;

        if !output.status.success() {
            remove_partial_downloads(dest_dir, stem);
            return Err(classify_failure(url, &String::from_utf8_lossy(&output.stderr)));
        }

        let path = dest_dir.join(format!("{}.{}", stem, self.audio_format.as_str()));
        if !path.is_file() {
            remove_partial_downloads(dest_dir, stem);
            return Err(ClipError::SourceUnavailable {
                url: url.to_string(),
                reason: format!("yt-dlp finished but {} was not written", path.display()),
            });
        }

        Ok(path)
    }
}

/// Delete whatever a failed download left under `<stem>.*` in `dest_dir`
fn remove_partial_downloads(dest_dir: &Path, stem: &str) {
    let prefix = format!("{}.", stem);
    let entries = match fs_err::read_dir(dest_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Could not scan for partial downloads: {}", e);
            return;
        }
    };

    for entry in entries.flatten() {
        let is_partial = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(&prefix));
        if !is_partial {
            continue;
        }
        match fs_err::remove_file(entry.path()) {
            Ok(()) => tracing::debug!("Removed partial download: {}", entry.path().display()),
            Err(e) => tracing::warn!("Could not remove partial download: {}", e),
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> ClipResult<FetchedAudio> {
        let url = utils::validate_and_normalize_url(url).map_err(|e| {
            ClipError::UnresolvableSource {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        if !self.check_availability().await {
            return Err(ClipError::ToolNotFound {
                tool: self.yt_dlp_path.clone(),
            });
        }

        let info = self.get_video_info(&url).await?;
        tracing::info!(
            "Found '{}' ({}) on {}",
            info.title.as_deref().unwrap_or("untitled"),
            info.id,
            utils::extract_domain(&url).unwrap_or_else(|| "unknown host".to_string())
        );

        fs_err::create_dir_all(dest_dir).map_err(|source| ClipError::Workspace {
            path: dest_dir.to_path_buf(),
            source,
        })?;

        let stem = format!(
            "{}_{}",
            utils::sanitize_filename(&info.id),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let path = self.download(&url, dest_dir, &stem).await?;

        // Prefer the downloaded file's real length over the advertised one
        let duration = match utils::probe_duration(&self.ffprobe_path, &path).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                tracing::debug!("ffprobe failed, using metadata duration: {:#}", e);
                info.duration
            }
        };

        Ok(FetchedAudio {
            path,
            duration,
            source_id: info.id,
            title: info.title,
        })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
