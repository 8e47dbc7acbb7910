use console::style;
use std::path::{Path, PathBuf};

use crate::fetch::{AudioFormat, FetchedAudio};
use crate::pipeline::ClipOutcome;
use crate::timespec::{format_clock, pad_seconds, TimeOffset, TimeShape, TimeSpec};
use crate::utils;

/// Default output path for a clip of `audio`.
///
/// `<dir>/<title>_<id>_trimmed_<HH-MM-SS>_to_<HH-MM-SS>.<ext>`, the title part dropped
/// when unknown. Different windows of the same source never share a name.
pub fn derive_output_path(
    dir: &Path,
    audio: &FetchedAudio,
    spec: &TimeSpec,
    format: AudioFormat,
) -> PathBuf {
    let id = utils::sanitize_filename(&audio.source_id);
    let id = if id.is_empty() { "audio".to_string() } else { id };

    let stem = match audio.title.as_deref().map(utils::sanitize_filename) {
        Some(title) if !title.is_empty() && title != id => format!("{}_{}", title, id),
        _ => id,
    };

    dir.join(format!(
        "{}_trimmed_{}_to_{}.{}",
        stem,
        filename_stamp(spec.start()),
        filename_stamp(spec.end()),
        format.as_str()
    ))
}

/// `HH-MM-SS`, with the seconds fraction kept to the millisecond
pub fn filename_stamp(seconds: f64) -> String {
    match TimeOffset::from_seconds(seconds, TimeShape::HourMinSec) {
        TimeOffset::HourMinSec {
            hours,
            minutes,
            seconds,
        } => format!("{:02}-{:02}-{}", hours, minutes, pad_seconds(seconds)),
        other => other.to_string(),
    }
}

/// Print the final report of a successful run
pub fn print_summary(outcome: &ClipOutcome) {
    let size = fs_err::metadata(&outcome.output_path)
        .map(|meta| utils::format_file_size(meta.len()))
        .unwrap_or_else(|_| "unknown size".to_string());

    if let Some(title) = &outcome.title {
        println!("Source: {}", title);
    }
    println!(
        "Clip: {} to {} ({})",
        format_clock(outcome.spec.start()),
        format_clock(outcome.spec.end()),
        utils::format_duration(outcome.spec.length())
    );
    if outcome.temp_retained {
        println!("Full download kept at: {}", outcome.temp_path.display());
    }
    println!(
        "{} Trimmed audio saved as: {} ({})",
        style("✓").green().bold(),
        style(outcome.output_path.display()).bold(),
        size
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(title: Option<&str>) -> FetchedAudio {
        FetchedAudio {
            path: PathBuf::from("/tmp/yt-trim/dQw4w9WgXcQ_1a2b3c4d.mp3"),
            duration: Some(300.0),
            source_id: "dQw4w9WgXcQ".to_string(),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn test_filename_stamp() {
        assert_eq!(filename_stamp(30.0), "00-00-30");
        assert_eq!(filename_stamp(135.0), "00-02-15");
        assert_eq!(filename_stamp(8820.0), "02-27-00");
        assert_eq!(filename_stamp(5.5), "00-00-05.5");
    }

    #[test]
    fn test_filename_stamp_rounds_fractions() {
        assert_eq!(filename_stamp(70.3), "00-01-10.3");
        assert_eq!(filename_stamp(3600.1), "01-00-00.1");
        assert_eq!(filename_stamp(12.0004), "00-00-12");

        let spec = TimeSpec::parse("1:10.3", "1:00:00.1").unwrap();
        let path = derive_output_path(Path::new(""), &audio(None), &spec, AudioFormat::Mp3);
        assert_eq!(
            path,
            PathBuf::from("dQw4w9WgXcQ_trimmed_00-01-10.3_to_01-00-00.1.mp3")
        );
    }

    #[test]
    fn test_derive_output_path_with_title() {
        let spec = TimeSpec::new(30.0, 135.0).unwrap();
        let audio = audio(Some("Never Gonna Give You Up!"));
        let path = derive_output_path(Path::new("clips"), &audio, &spec, AudioFormat::Mp3);
        assert_eq!(
            path,
            PathBuf::from("clips/Never-Gonna-Give-You-Up_dQw4w9WgXcQ_trimmed_00-00-30_to_00-02-15.mp3")
        );
    }

    #[test]
    fn test_derive_output_path_without_title() {
        let spec = TimeSpec::new(0.0, 10.0).unwrap();
        let path = derive_output_path(Path::new(""), &audio(None), &spec, AudioFormat::Wav);
        assert_eq!(path, PathBuf::from("dQw4w9WgXcQ_trimmed_00-00-00_to_00-00-10.wav"));
    }

    #[test]
    fn test_equivalent_windows_share_a_name() {
        let clock = TimeSpec::parse("0:30", "2:15").unwrap();
        let plain = TimeSpec::parse("30", "135").unwrap();
        let other = TimeSpec::parse("0:30", "2:16").unwrap();
        let dir = Path::new("out");
        let a = derive_output_path(dir, &audio(None), &clock, AudioFormat::Mp3);
        assert_eq!(a, derive_output_path(dir, &audio(None), &plain, AudioFormat::Mp3));
        assert_ne!(a, derive_output_path(dir, &audio(None), &other, AudioFormat::Mp3));
    }
}
