//! yt-trim - download the audio of an online video and keep only a time window
//!
//! The download is delegated to `yt-dlp` and the trim to `ffmpeg`; this crate parses
//! and validates the requested window and sequences the two tools.

pub mod cli;
pub mod config;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod timespec;
pub mod trim;
pub mod utils;

use std::path::PathBuf;

pub use cli::{Cli, LogFormat};
pub use config::Config;
pub use fetch::{AudioFormat, FetchedAudio, MediaFetcher};
pub use pipeline::{ClipOutcome, ClipPipeline, ClipRequest, Stage};
pub use timespec::{TimeOffset, TimeSpec};
pub use trim::MediaTrimmer;

/// Result type returned by the pipeline and its collaborators
pub type ClipResult<T> = std::result::Result<T, ClipError>;

/// Every way a clip run can fail
#[derive(thiserror::Error, Debug)]
pub enum ClipError {
    #[error("malformed time string '{input}': {reason}")]
    MalformedTimeString { input: String, reason: String },

    #[error("invalid range: end ({end}s) must be after start ({start}s)")]
    InvalidRange { start: f64, end: f64 },

    #[error("negative offset in range {start}s to {end}s")]
    NegativeOffset { start: f64, end: f64 },

    #[error("cannot resolve source {url}: {reason}")]
    UnresolvableSource { url: String, reason: String },

    #[error("network failure while fetching {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    #[error("source {url} is unavailable: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("{tool} is not installed or not on PATH")]
    ToolNotFound { tool: String },

    #[error(
        "requested end {} ({end}s) exceeds media duration {} ({duration}s)",
        clock(.end),
        clock(.duration)
    )]
    RangeExceedsMedia { end: f64, duration: f64 },

    #[error("trim failed: {0}")]
    TrimFailure(String),

    #[error("cannot prepare working directory {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn clock(seconds: &f64) -> String {
    timespec::format_clock(*seconds)
}

impl ClipError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            ClipError::MalformedTimeString { .. }
            | ClipError::InvalidRange { .. }
            | ClipError::NegativeOffset { .. }
            | ClipError::InvalidConfig(_) => 2,
            ClipError::UnresolvableSource { .. }
            | ClipError::NetworkFailure { .. }
            | ClipError::SourceUnavailable { .. }
            | ClipError::ToolNotFound { .. } => 3,
            ClipError::RangeExceedsMedia { .. } => 4,
            ClipError::TrimFailure(_) => 5,
            ClipError::Workspace { .. } => 1,
        }
    }
}
