use crate::Result;
use crate::segments::Segment;

/// Streaming serializer for one subtitle format.
///
/// Callers write segments in engine order and must call `close()` exactly once at the end so
/// formats with a mandatory header or trailer stay well-formed even when no segment was written.
pub trait SegmentEncoder {
    fn write_segment(&mut self, seg: &Segment) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
