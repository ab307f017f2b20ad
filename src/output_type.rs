use std::fmt;

/// The supported output formats for encoded transcription segments.
///
/// Each variant maps to a concrete `SegmentEncoder` implementation and to the file extension
/// appended to the output base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputType {
    /// SubRip subtitles (`.srt`).
    Srt,

    /// WebVTT subtitles (`.vtt`).
    Vtt,

    /// Cues as a JSON array (`.json`).
    Json,
}

impl OutputType {
    pub fn extension(self) -> &'static str {
        match self {
            OutputType::Srt => "srt",
            OutputType::Vtt => "vtt",
            OutputType::Json => "json",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
