use serde::Serialize;

/// One recognized utterance span.
///
/// `text` is kept exactly as the backend produced it (whisper usually prefixes a space);
/// encoders trim it on output.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Segment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    /// The cue text as it should appear in subtitle output.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// Metadata for a whole transcription run.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TranscriptionInfo {
    /// Detected language code (e.g. `"en"`), `"und"` when unknown.
    pub language: String,

    /// Confidence of the detection, in `[0, 1]`.
    pub language_probability: f32,
}
