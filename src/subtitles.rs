//! Writing segment sequences to subtitle files.
//!
//! Segment sequences coming from a backend are lazy and can only be walked once, so every format
//! requested for a run is fed from the *same* pass. Each target is staged in a temp file next to
//! its destination and only moved into place once the whole sequence was consumed, which means an
//! error halfway through never leaves a truncated subtitle file behind. If moving one target into
//! place fails, the targets already moved by that call are removed again; a file they replaced is
//! not restored.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::Result;
use crate::json_array_encoder::JsonArrayEncoder;
use crate::output_type::OutputType;
use crate::segment_encoder::SegmentEncoder;
use crate::segments::Segment;
use crate::srt_encoder::SrtEncoder;
use crate::vtt_encoder::VttEncoder;

/// One output file to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub output_type: OutputType,
    pub path: PathBuf,
}

impl Target {
    pub fn new(output_type: OutputType, path: impl Into<PathBuf>) -> Self {
        Self {
            output_type,
            path: path.into(),
        }
    }
}

/// Build the encoder for `output_type` on top of `w`.
pub fn encoder_for<'a, W: Write + 'a>(
    output_type: OutputType,
    w: W,
) -> Box<dyn SegmentEncoder + 'a> {
    match output_type {
        OutputType::Srt => Box::new(SrtEncoder::new(w)),
        OutputType::Vtt => Box::new(VttEncoder::new(w)),
        OutputType::Json => Box::new(JsonArrayEncoder::new(w)),
    }
}

/// Write `segments` to every target in a single forward pass.
///
/// Existing files are overwritten. Returns the number of segments written.
pub fn write_subtitles<I>(segments: I, targets: &[Target]) -> Result<usize>
where
    I: IntoIterator<Item = Result<Segment>>,
{
    let mut staged = targets
        .iter()
        .map(|target| stage_next_to(&target.path))
        .collect::<Result<Vec<_>>>()?;

    let count = {
        let mut encoders: Vec<Box<dyn SegmentEncoder + '_>> = targets
            .iter()
            .zip(staged.iter_mut())
            .map(|(target, tmp)| {
                encoder_for(target.output_type, BufWriter::new(tmp.as_file_mut()))
            })
            .collect();

        let mut count = 0usize;
        for seg in segments {
            let seg = seg?;
            for encoder in encoders.iter_mut() {
                encoder.write_segment(&seg)?;
            }
            count += 1;
        }

        for encoder in encoders.iter_mut() {
            encoder.close()?;
        }
        count
    };

    let mut placed: Vec<&Path> = Vec::with_capacity(targets.len());
    for (target, tmp) in targets.iter().zip(staged) {
        if let Err(err) = tmp.persist(&target.path) {
            for path in placed {
                if let Err(rm_err) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %rm_err, "failed to roll back subtitle file");
                }
            }
            return Err(err.into());
        }
        placed.push(target.path.as_path());
        debug!(path = %target.path.display(), format = %target.output_type, "subtitle file written");
    }

    Ok(count)
}

/// Write `segments` as SRT to `path`.
pub fn write_srt<I>(segments: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = Result<Segment>>,
{
    write_subtitles(segments, &[Target::new(OutputType::Srt, path)])?;
    Ok(())
}

/// Write `segments` as WebVTT to `path`.
pub fn write_vtt<I>(segments: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = Result<Segment>>,
{
    write_subtitles(segments, &[Target::new(OutputType::Vtt, path)])?;
    Ok(())
}

fn stage_next_to(path: &Path) -> Result<NamedTempFile<File>> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = tempfile::Builder::new()
        .prefix(".subtitler-")
        .suffix(".part")
        .tempfile_in(dir)?;
    Ok(tmp)
}
