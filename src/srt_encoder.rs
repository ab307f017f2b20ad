use std::io::Write;

use crate::Result;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::timestamp::{TimestampStyle, format_timestamp};

/// A `SegmentEncoder` that writes segments in SubRip (SRT) format.
///
/// Cues are numbered from 1 in the order they are written. We never re-sort, so ordinals follow
/// engine order even when timestamps repeat or overlap. SRT has no header: an empty run produces
/// an empty output.
pub struct SrtEncoder<W: Write> {
    w: W,

    /// Ordinal of the next cue.
    next_index: u64,

    closed: bool,
}

impl<W: Write> SrtEncoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            next_index: 1,
            closed: false,
        }
    }
}

impl<W: Write> SegmentEncoder for SrtEncoder<W> {
    fn write_segment(&mut self, seg: &Segment) -> Result<()> {
        if self.closed {
            return Err(crate::Error::invalid_input(
                "cannot write segment: encoder is already closed",
            ));
        }

        let start = format_timestamp(seg.start_seconds, TimestampStyle::Srt)?;
        let end = format_timestamp(seg.end_seconds, TimestampStyle::Srt)?;

        writeln!(&mut self.w, "{}", self.next_index)?;
        writeln!(&mut self.w, "{start} --> {end}")?;
        writeln!(&mut self.w, "{}", seg.trimmed_text())?;
        writeln!(&mut self.w)?;

        self.next_index += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}
