use std::io::Write;

use crate::Result;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::timestamp::{TimestampStyle, format_timestamp};

/// A `SegmentEncoder` that writes segments in WebVTT format.
///
/// Design:
/// - We stream output directly to a `Write` implementation.
/// - The `WEBVTT` header is written lazily on the first segment, or on `close()` when no
///   segment arrived, so an empty run still yields a valid (header-only) file.
pub struct VttEncoder<W: Write> {
    /// The underlying writer we stream VTT into.
    w: W,

    /// Whether we've written the `WEBVTT` header.
    started: bool,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> VttEncoder<W> {
    /// Create a new VTT encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            closed: false,
        }
    }

    /// Write the WebVTT header if we haven't written it yet.
    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            // WebVTT files begin with a mandatory header line followed by a blank line.
            self.w.write_all(b"WEBVTT\n\n")?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> SegmentEncoder for VttEncoder<W> {
    /// Write a single cue in WebVTT format.
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            return Err(crate::Error::invalid_input(
                "cannot write segment: encoder is already closed",
            ));
        }

        self.start_if_needed()?;

        let start = format_timestamp(seg.start_seconds, TimestampStyle::Vtt)?;
        let end = format_timestamp(seg.end_seconds, TimestampStyle::Vtt)?;

        // Cue timing line, cue text, blank separator. No cue identifiers.
        writeln!(&mut self.w, "{start} --> {end}")?;
        writeln!(&mut self.w, "{}", seg.trimmed_text())?;
        writeln!(&mut self.w)?;

        Ok(())
    }

    /// Emit the header if nothing was written and flush. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.start_if_needed()?;
        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}
