use std::fmt;

use crate::{ClipError, ClipResult};

/// Shape a single time string was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeShape {
    /// `SS` or `SS.frac`
    Seconds,
    /// `MM:SS`
    MinSec,
    /// `HH:MM:SS`
    HourMinSec,
}

/// A parsed time string, still remembering how it was written
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeOffset {
    Seconds(f64),
    MinSec { minutes: u64, seconds: f64 },
    HourMinSec { hours: u64, minutes: u64, seconds: f64 },
}

impl TimeOffset {
    /// Parse `SS`, `MM:SS` or `HH:MM:SS`.
    ///
    /// The shape is chosen by the number of `:` separators, so `"1:30"` is never read
    /// as plain seconds. The leading component is unbounded; minutes and seconds that
    /// follow another component must be below 60. Only the seconds component may carry
    /// a fraction.
    pub fn parse(raw: &str) -> ClipResult<Self> {
        let text = raw.trim();
        let parts: Vec<&str> = text.split(':').collect();

        let offset = match parts.as_slice() {
            [seconds] => parse_seconds(seconds, None).map(TimeOffset::Seconds),
            [minutes, seconds] => parse_whole(minutes, None).and_then(|minutes| {
                Ok(TimeOffset::MinSec {
                    minutes,
                    seconds: parse_seconds(seconds, Some(60.0))?,
                })
            }),
            [hours, minutes, seconds] => parse_whole(hours, None).and_then(|hours| {
                Ok(TimeOffset::HourMinSec {
                    hours,
                    minutes: parse_whole(minutes, Some(60))?,
                    seconds: parse_seconds(seconds, Some(60.0))?,
                })
            }),
            _ => Err("expected SS, MM:SS or HH:MM:SS"),
        };

        offset.map_err(|reason| ClipError::MalformedTimeString {
            input: raw.to_string(),
            reason: reason.to_string(),
        })
    }

    /// Render `total` seconds in the given shape, rounded to the millisecond
    pub fn from_seconds(total: f64, shape: TimeShape) -> Self {
        let millis = (total.max(0.0) * 1000.0).round() as u64;
        let seconds_of = |millis: u64| millis as f64 / 1000.0;
        match shape {
            TimeShape::Seconds => TimeOffset::Seconds(seconds_of(millis)),
            TimeShape::MinSec => TimeOffset::MinSec {
                minutes: millis / 60_000,
                seconds: seconds_of(millis % 60_000),
            },
            TimeShape::HourMinSec => TimeOffset::HourMinSec {
                hours: millis / 3_600_000,
                minutes: millis % 3_600_000 / 60_000,
                seconds: seconds_of(millis % 60_000),
            },
        }
    }

    pub fn shape(&self) -> TimeShape {
        match self {
            TimeOffset::Seconds(_) => TimeShape::Seconds,
            TimeOffset::MinSec { .. } => TimeShape::MinSec,
            TimeOffset::HourMinSec { .. } => TimeShape::HourMinSec,
        }
    }

    /// Absolute offset in seconds
    pub fn as_seconds(&self) -> f64 {
        match *self {
            TimeOffset::Seconds(seconds) => seconds,
            TimeOffset::MinSec { minutes, seconds } => minutes as f64 * 60.0 + seconds,
            TimeOffset::HourMinSec {
                hours,
                minutes,
                seconds,
            } => hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        }
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeOffset::Seconds(seconds) => write!(f, "{}", seconds),
            TimeOffset::MinSec { minutes, seconds } => {
                write!(f, "{}:{}", minutes, pad_seconds(seconds))
            }
            TimeOffset::HourMinSec {
                hours,
                minutes,
                seconds,
            } => write!(f, "{}:{:02}:{}", hours, minutes, pad_seconds(seconds)),
        }
    }
}

/// A validated trim window, `0 <= start < end`, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpec {
    start: f64,
    end: f64,
}

impl TimeSpec {
    pub fn new(start: f64, end: f64) -> ClipResult<Self> {
        validate(start, end)?;
        Ok(Self { start, end })
    }

    /// Parse both raw strings and validate the pair
    pub fn parse(start_raw: &str, end_raw: &str) -> ClipResult<Self> {
        let start = TimeOffset::parse(start_raw)?.as_seconds();
        let end = TimeOffset::parse(end_raw)?.as_seconds();
        Self::new(start, end)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the window in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Check the window against the fetched media's duration. `end == duration` is accepted.
    pub fn validate_against_duration(&self, duration: f64) -> ClipResult<()> {
        if self.end > duration {
            return Err(ClipError::RangeExceedsMedia {
                end: self.end,
                duration,
            });
        }
        Ok(())
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({}s)",
            format_clock(self.start),
            format_clock(self.end),
            TimeOffset::from_seconds(self.length(), TimeShape::Seconds)
        )
    }
}

/// Validate a raw `(start, end)` pair
pub fn validate(start: f64, end: f64) -> ClipResult<()> {
    if !is_valid_offset(start) || !is_valid_offset(end) {
        return Err(ClipError::NegativeOffset { start, end });
    }
    if end <= start {
        return Err(ClipError::InvalidRange { start, end });
    }
    Ok(())
}

/// `M:SS` below an hour, `H:MM:SS` above
pub fn format_clock(seconds: f64) -> String {
    let shape = if seconds >= 3600.0 {
        TimeShape::HourMinSec
    } else {
        TimeShape::MinSec
    };
    TimeOffset::from_seconds(seconds, shape).to_string()
}

fn is_valid_offset(value: f64) -> bool {
    value >= 0.0
}

/// Seconds below 10 get a leading zero, so `5.5` renders as `05.5`
pub(crate) fn pad_seconds(seconds: f64) -> String {
    if seconds < 10.0 {
        format!("0{}", seconds)
    } else {
        seconds.to_string()
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

type Component<T> = std::result::Result<T, &'static str>;

fn parse_whole(text: &str, limit: Option<u64>) -> Component<u64> {
    if !is_digits(text) {
        return Err("hours and minutes must be whole non-negative numbers");
    }
    let value: u64 = text.parse().map_err(|_| "component is too large")?;
    if limit.is_some_and(|limit| value >= limit) {
        return Err("minutes must be below 60");
    }
    Ok(value)
}

fn parse_seconds(text: &str, limit: Option<f64>) -> Component<f64> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    if !is_digits(whole) || fraction.is_some_and(|fraction| !is_digits(fraction)) {
        return Err("seconds must be a non-negative number");
    }

    let value: f64 = text
        .parse()
        .map_err(|_| "seconds must be a non-negative number")?;
    if !value.is_finite() {
        return Err("seconds value is too large");
    }
    if limit.is_some_and(|limit| value >= limit) {
        return Err("seconds must be below 60");
    }
    Ok(value)
}
