use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::fetch::{AudioFormat, FetchedAudio, MediaFetcher, YtDlpFetcher};
use crate::output;
use crate::timespec::TimeSpec;
use crate::trim::{FfmpegTrimmer, MediaTrimmer};
use crate::ClipResult;

/// Steps of a clip run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Parsed,
    Fetched,
    Validated,
    Trimmed,
    CleanedUp,
    Done,
    /// Terminal state of a run that returned an error
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Parsed => "parsed",
            Stage::Fetched => "fetched",
            Stage::Validated => "validated",
            Stage::Trimmed => "trimmed",
            Stage::CleanedUp => "cleaned-up",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the user asked for
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub url: String,
    pub start: String,
    pub end: String,
    /// Explicit output path; derived when absent
    pub output: Option<PathBuf>,
    /// Keep the full-length download after a successful trim
    pub keep_temp: bool,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct ClipOutcome {
    pub output_path: PathBuf,
    pub temp_path: PathBuf,
    /// Whether `temp_path` was left on disk
    pub temp_retained: bool,
    pub spec: TimeSpec,
    pub media_duration: Option<f64>,
    pub title: Option<String>,
    /// Stages passed through, ending in [`Stage::Done`]
    pub stages: Vec<Stage>,
}

/// Parse, fetch, validate, trim and clean up, one stage at a time
pub struct ClipPipeline {
    config: Config,
    fetcher: Box<dyn MediaFetcher>,
    trimmer: Box<dyn MediaTrimmer>,
}

impl ClipPipeline {
    /// Pipeline backed by yt-dlp and ffmpeg
    pub fn new(config: Config) -> Self {
        let fetcher = YtDlpFetcher::new(&config.tools.yt_dlp, &config.tools.ffprobe);
        let trimmer = FfmpegTrimmer::new(
            &config.tools.ffmpeg,
            config.app.audio_format,
            &config.app.bitrate,
        );
        Self::with_collaborators(config, Box::new(fetcher), Box::new(trimmer))
    }

    pub fn with_collaborators(
        config: Config,
        fetcher: Box<dyn MediaFetcher>,
        trimmer: Box<dyn MediaTrimmer>,
    ) -> Self {
        Self {
            config,
            fetcher,
            trimmer,
        }
    }

    /// Run one download-trim-export cycle
    pub async fn run(&self, request: &ClipRequest) -> ClipResult<ClipOutcome> {
        let mut stages = Vec::new();
        self.run_recorded(request, &mut stages).await
    }

    /// Run while recording every stage entered; a failed run ends in [`Stage::Failed`]
    async fn run_recorded(
        &self,
        request: &ClipRequest,
        stages: &mut Vec<Stage>,
    ) -> ClipResult<ClipOutcome> {
        stages.push(Stage::Start);

        let result = self.run_stages(request, stages).await;
        if let Err(err) = &result {
            let reached = stages.last().copied().unwrap_or(Stage::Start);
            tracing::debug!(stage = %reached, error = %err, "Clip run failed");
            enter(stages, Stage::Failed);
        }
        result
    }

    async fn run_stages(
        &self,
        request: &ClipRequest,
        stages: &mut Vec<Stage>,
    ) -> ClipResult<ClipOutcome> {
        let spec = TimeSpec::parse(&request.start, &request.end)?;
        enter(stages, Stage::Parsed);
        tracing::info!("Time range: {}", spec);

        tracing::info!("Downloading audio from: {}", request.url);
        let audio = {
            let progress =
                self.spinner(format!("Downloading audio with {}...", self.fetcher.name()));
            let fetched = self.fetcher.fetch(&request.url, &self.config.app.temp_dir).await;
            progress.finish_and_clear();
            fetched?
        };
        enter(stages, Stage::Fetched);
        tracing::info!("Downloaded: {}", audio.path.display());

        match audio.duration {
            Some(duration) => {
                if let Err(err) = spec.validate_against_duration(duration) {
                    // No trim will happen, so the download is useless even with --keep-temp
                    remove_temp(&audio.path);
                    return Err(err);
                }
            }
            None => tracing::warn!(
                "Could not determine the media duration; skipping the range check"
            ),
        }
        enter(stages, Stage::Validated);

        let output_path = self.output_path(request, &audio, &spec);
        {
            let progress = self.spinner(format!("Trimming with {}...", self.trimmer.name()));
            let trimmed = self.trimmer.trim(&audio.path, &spec, &output_path).await;
            progress.finish_and_clear();
            if let Err(err) = trimmed {
                tracing::warn!(
                    "Keeping the full download at {} so the trim can be retried",
                    audio.path.display()
                );
                return Err(err);
            }
        }
        enter(stages, Stage::Trimmed);
        tracing::info!("Created trimmed audio: {} [{}]", output_path.display(), spec);

        let temp_retained = if request.keep_temp {
            tracing::info!("Keeping temporary file: {}", audio.path.display());
            true
        } else {
            remove_temp(&audio.path);
            false
        };
        enter(stages, Stage::CleanedUp);

        enter(stages, Stage::Done);
        Ok(ClipOutcome {
            output_path,
            temp_path: audio.path,
            temp_retained,
            spec,
            media_duration: audio.duration,
            title: audio.title,
            stages: std::mem::take(stages),
        })
    }

    fn output_path(
        &self,
        request: &ClipRequest,
        audio: &FetchedAudio,
        spec: &TimeSpec,
    ) -> PathBuf {
        match &request.output {
            Some(path) => path.clone(),
            None => output::derive_output_path(
                &self.config.app.output_dir,
                audio,
                spec,
                self.output_format(),
            ),
        }
    }

    fn output_format(&self) -> AudioFormat {
        self.config.app.audio_format
    }

    fn spinner(&self, message: String) -> ProgressBar {
        if !self.config.app.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            progress.set_style(style);
        }
        progress.set_message(message);
        progress.enable_steady_tick(Duration::from_millis(120));
        progress
    }
}

fn enter(stages: &mut Vec<Stage>, stage: Stage) {
    tracing::debug!(stage = %stage, "Entering stage");
    stages.push(stage);
}

/// Delete the full-length download; failures only warn
fn remove_temp(path: &Path) {
    match fs_err::remove_file(path) {
        Ok(()) => tracing::info!("Cleaned up temporary file: {}", path.display()),
        Err(e) => tracing::warn!("Could not remove temporary file: {}", e),
    }
}
