use std::path::Path;

use crate::Result;
use crate::segments::{Segment, TranscriptionInfo};

/// Pluggable ASR backend used by the [`crate::pipeline`].
///
/// A backend is a loaded model bound to a device and precision (an "engine handle"). It is
/// released when dropped; the pipeline owns it for exactly one run and drops it on every exit
/// path.
pub trait Backend {
    /// Lazy, ordered, forward-only sequence of segments.
    ///
    /// Iteration may block on model work and may fail; the pipeline consumes it exactly once.
    type Segments: Iterator<Item = Result<Segment>>;

    /// Transcribe the audio file at `waveform`.
    ///
    /// `language` is a hint, not a guarantee: the returned [`TranscriptionInfo`] reports what the
    /// backend actually detected.
    /// Whether the backend can read the audio container at `path` itself.
    ///
    /// The pipeline only skips extraction for audio inputs the backend accepts here; anything
    /// else is normalized by the extractor first.
    fn reads_directly(&self, _path: &Path) -> bool {
        true
    }

    fn transcribe(
        &mut self,
        waveform: &Path,
        language: Option<&str>,
    ) -> Result<(Self::Segments, TranscriptionInfo)>;
}
