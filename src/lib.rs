//! `subtitler`: turn audio and video files into SRT / WebVTT subtitles with Whisper.
//!
//! This crate provides:
//! - Audio extraction through ffmpeg (skipped for inputs that already are audio)
//! - Transcription through a pluggable backend (whisper.cpp by default)
//! - Timestamp formatting and streaming subtitle encoders (SRT, VTT, JSON)
//! - A pipeline that wires it all together and always cleans up after itself
//!
//! Most consumers should start with [`pipeline::run`] and [`PipelineConfig`].

// High-level API (most consumers should start here).
pub mod opts;
pub mod pipeline;

// Transcription backends.
pub mod backend;
pub mod backends;
pub mod models;

// Segment data structures.
pub mod segments;

// Input handling: classification, extraction, decoding.
pub mod decoder;
pub mod extract;
pub mod media;
pub mod waveform;
pub mod wav;

// Output selection, timestamp formatting and encoders.
pub mod output_type;
pub mod segment_encoder;
pub mod subtitles;
pub mod timestamp;

pub mod json_array_encoder;
pub mod srt_encoder;
pub mod vtt_encoder;

// Logging configuration (binaries only).
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use backend::Backend;
pub use backends::whisper::WhisperBackend;
pub use error::{Error, Result};
pub use extract::{Extractor, FfmpegExtractor};
pub use opts::{ComputeType, Device, ModelOpts, ModelSize, PipelineConfig};
pub use output_type::OutputType;
pub use pipeline::{Report, Stage};
pub use segments::{Segment, TranscriptionInfo};
pub use timestamp::{TimestampStyle, format_timestamp};
