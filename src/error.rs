use std::fmt::Display;

use thiserror::Error;

/// Subtitler's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Subtitler's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs. Internally we still build context chains with
/// `anyhow` and flatten them into the matching variant at module boundaries.
#[derive(Debug, Error)]
pub enum Error {
    /// The external decoding tool could not be started because it isn't installed.
    #[error(
        "`{tool}` was not found; install it and make sure it is on PATH (or pass its location explicitly)"
    )]
    ToolNotFound { tool: String },

    /// The external decoding tool ran but exited unsuccessfully.
    ///
    /// `diagnostics` carries the tool's captured output verbatim.
    #[error("audio extraction with `{tool}` failed ({}): {diagnostics}", exit_status(.status))]
    ExtractionFailed {
        tool: String,
        status: Option<i32>,
        diagnostics: String,
    },

    /// The model/device/precision combination could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The speech-recognition engine failed while transcribing.
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn model_load(err: impl Display) -> Self {
        Self::ModelLoad(err.to_string())
    }

    pub(crate) fn transcription(err: anyhow::Error) -> Self {
        Self::Transcription(format!("{err:#}"))
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_owned(),
    }
}
