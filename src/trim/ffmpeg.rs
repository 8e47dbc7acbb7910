use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::MediaTrimmer;
use crate::fetch::AudioFormat;
use crate::timespec::TimeSpec;
use crate::{ClipError, ClipResult};

/// Trimmer backed by the ffmpeg binary
pub struct FfmpegTrimmer {
    ffmpeg_path: String,
    default_format: AudioFormat,
    bitrate: String,
}

impl FfmpegTrimmer {
    pub fn new(
        ffmpeg_path: impl Into<String>,
        default_format: AudioFormat,
        bitrate: impl Into<String>,
    ) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            default_format,
            bitrate: bitrate.into(),
        }
    }

    /// Encoder settings follow the output's extension, else the configured format
    pub fn format_for(&self, output: &Path) -> AudioFormat {
        AudioFormat::from_path(output).unwrap_or(self.default_format)
    }

    /// Command line for one trim
    pub fn build_args(&self, input: &Path, spec: &TimeSpec, output: &Path) -> Vec<OsString> {
        let format = self.format_for(output);

        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.into(),
            "-ss".into(),
            format!("{:.3}", spec.start()).into(),
            "-t".into(),
            format!("{:.3}", spec.length()).into(),
            "-vn".into(),
            "-c:a".into(),
            format.ffmpeg_codec().into(),
        ];

        if format.is_lossy() {
            args.push("-b:a".into());
            args.push(self.bitrate.clone().into());
        }

        // ffmpeg picks the container from the extension; name it when there is none
        if AudioFormat::from_path(output).is_none() {
            args.push("-f".into());
            args.push(format.ffmpeg_muxer().into());
        }

        args.push(output.into());
        args
    }
}

#[async_trait]
impl MediaTrimmer for FfmpegTrimmer {
    async fn trim(&self, input: &Path, spec: &TimeSpec, output: &Path) -> ClipResult<PathBuf> {
        tracing::debug!(
            "Trimming {} [{}] -> {}",
            input.display(),
            spec,
            output.display()
        );

        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(|e| ClipError::TrimFailure(e.to_string()))?;
        }

        let result = Command::new(&self.ffmpeg_path)
            .args(self.build_args(input, spec, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ClipError::TrimFailure(format!(
                    "{} is not installed or not on PATH",
                    self.ffmpeg_path
                )),
                _ => ClipError::TrimFailure(format!("failed to run {}: {}", self.ffmpeg_path, e)),
            })?;

        if !result.status.success() {
            let error = String::from_utf8_lossy(&result.stderr);
            return Err(ClipError::TrimFailure(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                error.trim()
            )));
        }

        if !output.is_file() {
            return Err(ClipError::TrimFailure(format!(
                "ffmpeg finished but {} was not written",
                output.display()
            )));
        }

        Ok(output.to_path_buf())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_as_strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_build_args_for_mp3() {
        let trimmer = FfmpegTrimmer::new("ffmpeg", AudioFormat::Mp3, "192k");
        let spec = TimeSpec::new(30.0, 135.0).unwrap();
        let args = args_as_strings(trimmer.build_args(
            Path::new("/tmp/in.mp3"),
            &spec,
            Path::new("out.mp3"),
        ));

        assert_eq!(
            args,
            vec![
                "-hide_banner", "-loglevel", "error", "-y", "-i", "/tmp/in.mp3", "-ss", "30.000",
                "-t", "105.000", "-vn", "-c:a", "libmp3lame", "-b:a", "192k", "out.mp3",
            ]
        );
    }

    #[test]
    fn test_output_extension_overrides_default_format() {
        let trimmer = FfmpegTrimmer::new("ffmpeg", AudioFormat::Mp3, "192k");
        let spec = TimeSpec::new(0.5, 2.25).unwrap();
        let args = args_as_strings(trimmer.build_args(
            Path::new("in.mp3"),
            &spec,
            Path::new("clip.flac"),
        ));

        assert!(args.contains(&"flac".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
        assert!(args.contains(&"1.750".to_string()));
        assert!(!args.contains(&"-f".to_string()));
        assert_eq!(trimmer.format_for(Path::new("clip")), AudioFormat::Mp3);
    }

    #[test]
    fn test_unrecognised_extension_names_the_container() {
        let trimmer = FfmpegTrimmer::new("ffmpeg", AudioFormat::Flac, "192k");
        let spec = TimeSpec::new(0.0, 10.0).unwrap();

        let args = args_as_strings(trimmer.build_args(
            Path::new("in.mp3"),
            &spec,
            Path::new("clip"),
        ));
        assert_eq!(
            &args[args.len() - 5..],
            &["-c:a", "flac", "-f", "flac", "clip"]
        );

        let trimmer = FfmpegTrimmer::new("ffmpeg", AudioFormat::M4a, "128k");
        let args = args_as_strings(trimmer.build_args(
            Path::new("in.mp3"),
            &spec,
            Path::new("clip.txt"),
        ));
        assert_eq!(
            &args[args.len() - 7..],
            &["-c:a", "aac", "-b:a", "128k", "-f", "ipod", "clip.txt"]
        );
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_trim_failure() {
        let trimmer = FfmpegTrimmer::new("ffmpeg-definitely-missing", AudioFormat::Mp3, "192k");
        let dir = tempfile::tempdir().unwrap();
        let spec = TimeSpec::new(0.0, 1.0).unwrap();
        let err = trimmer
            .trim(&dir.path().join("in.mp3"), &spec, &dir.path().join("out.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClipError::TrimFailure(message) if message.contains("not installed")
        ));
    }
}
