//! Subtitle clock formatting.
//!
//! SRT and WebVTT share the same `HH:MM:SS?mmm` layout and only disagree on the separator
//! between seconds and milliseconds.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Which subtitle dialect a timestamp is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// SubRip: `HH:MM:SS,mmm`.
    Srt,
    /// WebVTT: `HH:MM:SS.mmm`.
    Vtt,
}

impl TimestampStyle {
    fn separator(self) -> char {
        match self {
            TimestampStyle::Srt => ',',
            TimestampStyle::Vtt => '.',
        }
    }
}

impl FromStr for TimestampStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "srt" => Ok(TimestampStyle::Srt),
            "vtt" => Ok(TimestampStyle::Vtt),
            other => Err(Error::UnsupportedFormat(format!(
                "timestamp style must be 'srt' or 'vtt', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TimestampStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampStyle::Srt => f.write_str("srt"),
            TimestampStyle::Vtt => f.write_str("vtt"),
        }
    }
}

/// Format an offset in seconds as a subtitle timestamp.
///
/// We round to the nearest millisecond on the *total* so a carry (e.g. `0.9995s`) rolls into
/// the seconds field instead of producing a four-digit millisecond value.
pub fn format_timestamp(seconds: f64, style: TimestampStyle) -> Result<String> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::invalid_input(format!(
            "timestamp must be a finite, non-negative number of seconds, got {seconds}"
        )));
    }

    let total_ms = (seconds * 1000.0).round() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    let sep = style.separator();
    Ok(format!("{h:02}:{m:02}:{s:02}{sep}{ms:03}"))
}
