use std::io::Write;

use serde::Serialize;

use crate::Result;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;

/// A `SegmentEncoder` that writes cues as a single JSON array.
///
/// Design:
/// - We stream output directly to a `Write` implementation to avoid buffering
///   all segments in memory.
/// - The encoder is stateful so we can emit a well-formed JSON array incrementally.
///
/// Example output:
/// ```json
/// [{"start":0.5,"end":1.8,"text":"Hello world"}]
/// ```
pub struct JsonArrayEncoder<W: Write> {
    /// The underlying writer we stream JSON into.
    w: W,

    /// Whether we have written the opening `[` of the JSON array.
    started: bool,

    /// Whether the next element will be the first element in the array.
    first: bool,

    /// Whether the encoder has been closed.
    closed: bool,
}

/// The on-disk shape of one cue. Text is trimmed like in the subtitle formats.
#[derive(Serialize)]
struct JsonCue<'a> {
    start: f64,
    end: f64,
    text: &'a str,
}

impl<W: Write> JsonArrayEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            first: true,
            closed: false,
        }
    }

    /// Write the opening `[` of the JSON array if we have not already done so.
    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            self.w.write_all(b"[")?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> SegmentEncoder for JsonArrayEncoder<W> {
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            return Err(crate::Error::invalid_input(
                "cannot write segment: encoder is already closed",
            ));
        }

        self.start_if_needed()?;

        // Write a comma before every element except the first.
        if !self.first {
            self.w.write_all(b",")?;
        }
        self.first = false;

        let cue = JsonCue {
            start: seg.start_seconds,
            end: seg.end_seconds,
            text: seg.trimmed_text(),
        };
        serde_json::to_writer(&mut self.w, &cue)?;

        Ok(())
    }

    /// Finalize the JSON array and flush the underlying writer. Idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        // Ensure we still output a valid JSON array even if no segments were written.
        self.start_if_needed()?;

        self.w.write_all(b"]")?;
        self.w.flush()?;

        self.closed = true;
        Ok(())
    }
}
