//! Audio extraction through an external decoding tool.
//!
//! The extractor turns any media file into the waveform profile the backend expects:
//! mono, 16 kHz, signed 16-bit little-endian PCM in a WAV container.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::{Error, Result};

/// Target sample rate of extracted waveforms (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Something that can normalize a media file into a waveform file.
///
/// The pipeline only depends on this trait, so tests (and alternative decoders) can stand in
/// for the real subprocess.
pub trait Extractor {
    /// Write a mono 16 kHz `pcm_s16le` WAV of `input`'s audio to `output`, overwriting it.
    fn extract(&self, input: &Path, output: &Path) -> Result<()>;
}

/// [`Extractor`] backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: OsString,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegExtractor {
    /// Use `program` (a name resolved through `PATH`, or a full path) as the ffmpeg binary.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The configured ffmpeg program.
    pub fn program(&self) -> &OsString {
        &self.program
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-nostdin")
            .arg("-hide_banner")
            .arg("-i")
            .arg(input)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .args(["-ar", &TARGET_SAMPLE_RATE.to_string()])
            .args(["-ac", "1"])
            .arg(output)
            .arg("-y");
        cmd
    }
}

impl Extractor for FfmpegExtractor {
    fn extract(&self, input: &Path, output: &Path) -> Result<()> {
        let tool = self.program.to_string_lossy().into_owned();
        debug!(%tool, input = %input.display(), output = %output.display(), "spawning extractor");

        let out = match self.command(input, output).output() {
            Ok(out) => out,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ToolNotFound { tool });
            }
            Err(err) => return Err(Error::Io(err)),
        };

        if !out.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&out.stderr).into_owned();
            diagnostics.push_str(&String::from_utf8_lossy(&out.stdout));
            return Err(Error::ExtractionFailed {
                tool,
                status: out.status.code(),
                diagnostics,
            });
        }

        info!(output = %output.display(), "audio extracted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_uses_fixed_target_profile() {
        let extractor = FfmpegExtractor::default();
        let cmd = extractor.command(Path::new("in.mp4"), Path::new("out.wav"));

        assert_eq!(cmd.get_program(), "ffmpeg");
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-nostdin",
                "-hide_banner",
                "-i",
                "in.mp4",
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                "16000",
                "-ac",
                "1",
                "out.wav",
                "-y",
            ]
        );
    }

    #[test]
    fn missing_tool_is_reported_by_name() {
        let extractor = FfmpegExtractor::new("subtitler-test-no-such-ffmpeg");
        let err = extractor
            .extract(Path::new("in.mp4"), Path::new("out.wav"))
            .unwrap_err();

        match err {
            Error::ToolNotFound { tool } => assert_eq!(tool, "subtitler-test-no-such-ffmpeg"),
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_extraction_failure() {
        // `false` accepts and ignores any arguments and exits with status 1.
        let extractor = FfmpegExtractor::new("false");
        let err = extractor
            .extract(Path::new("in.mp4"), Path::new("out.wav"))
            .unwrap_err();

        match err {
            Error::ExtractionFailed { tool, status, .. } => {
                assert_eq!(tool, "false");
                assert_eq!(status, Some(1));
            }
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }
}
