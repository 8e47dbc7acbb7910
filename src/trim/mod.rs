use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod ffmpeg;

pub use ffmpeg::FfmpegTrimmer;

use crate::timespec::TimeSpec;
use crate::ClipResult;

/// Cuts a window out of a local audio file into a new file.
///
/// Implementations do no range checking; `spec` is already known to lie inside the input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTrimmer: Send + Sync {
    /// Write `spec`'s window of `input` to `output` and return the written path
    async fn trim(&self, input: &Path, spec: &TimeSpec, output: &Path) -> ClipResult<PathBuf>;

    /// Name of the backing tool, for log lines
    fn name(&self) -> &'static str;
}
