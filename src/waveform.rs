//! The waveform handed to the transcription backend.
//!
//! A waveform is either the caller's own audio file (passthrough) or a scoped temporary WAV
//! produced by the extractor. The temporary variant deletes its file when dropped, so every exit
//! path out of the pipeline (success, error, early return) cleans it up.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

use crate::Result;

/// A scoped, exclusively owned temporary WAV file.
///
/// The file is created empty (so the name is reserved) and removed on drop.
#[derive(Debug)]
pub struct TemporaryWaveform {
    path: TempPath,
}

impl TemporaryWaveform {
    /// Reserve a fresh `.wav` path inside `dir`, or the system temp directory when `None`.
    pub fn create(dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("subtitler-").suffix(".wav");

        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let path = file.into_temp_path();
        debug!(path = %path.display(), "reserved temporary waveform");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TemporaryWaveform {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "removing temporary waveform");
    }
}

/// Where the backend reads audio from for one pipeline run.
#[derive(Debug)]
pub enum Waveform {
    /// The input already is an audio container; use it directly.
    Passthrough(PathBuf),
    /// Extracted audio that lives only as long as this value.
    Temporary(TemporaryWaveform),
}

impl Waveform {
    pub fn path(&self) -> &Path {
        match self {
            Waveform::Passthrough(path) => path,
            Waveform::Temporary(tmp) => tmp.path(),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Waveform::Temporary(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_waveform_is_removed_on_drop() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let tmp = TemporaryWaveform::create(Some(dir.path()))?;
        let path = tmp.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
        assert!(path.starts_with(dir.path()));

        drop(tmp);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn removal_tolerates_files_already_gone() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let tmp = TemporaryWaveform::create(Some(dir.path()))?;
        std::fs::remove_file(tmp.path())?;
        drop(tmp);
        Ok(())
    }

    #[test]
    fn passthrough_points_at_the_input() {
        let wf = Waveform::Passthrough(PathBuf::from("talk.mp3"));
        assert_eq!(wf.path(), Path::new("talk.mp3"));
        assert!(!wf.is_temporary());
    }
}
