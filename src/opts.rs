use std::fmt;
use std::path::{Path, PathBuf};

use crate::output_type::OutputType;

/// Whisper model size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ModelSize {
    Tiny,
    Small,
    Medium,
    #[cfg_attr(feature = "cli", value(name = "large-v2"))]
    LargeV2,
    #[cfg_attr(feature = "cli", value(name = "large-v3"))]
    LargeV3,
}

impl ModelSize {
    pub const ALL: [ModelSize; 5] = [
        ModelSize::Tiny,
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::LargeV2,
        ModelSize::LargeV3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::LargeV2 => "large-v2",
            ModelSize::LargeV3 => "large-v3",
        }
    }
}

/// Where inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }
}

/// Numeric precision of the model weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ComputeType {
    Int8,
    Float16,
    Float32,
}

impl ComputeType {
    pub const ALL: [ComputeType; 3] = [ComputeType::Int8, ComputeType::Float16, ComputeType::Float32];

    pub fn as_str(self) -> &'static str {
        match self {
            ComputeType::Int8 => "int8",
            ComputeType::Float16 => "float16",
            ComputeType::Float32 => "float32",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(ModelSize, Device, ComputeType);

/// Everything needed to load a transcription backend.
#[derive(Debug, Clone)]
pub struct ModelOpts {
    pub size: ModelSize,
    pub device: Device,
    pub compute_type: ComputeType,

    /// Directory holding whisper.cpp model files (see [`crate::models`]).
    pub models_dir: PathBuf,

    /// Mute non-speech audio with a Silero VAD model before transcription.
    pub vad: bool,

    /// VAD model to use instead of the default one in `models_dir`.
    pub vad_model: Option<PathBuf>,
}

impl ModelOpts {
    /// The VAD model to load, or `None` when voice-activity filtering is off.
    pub fn vad_path(&self) -> Option<PathBuf> {
        if !self.vad {
            return None;
        }
        Some(
            self.vad_model
                .clone()
                .unwrap_or_else(|| crate::models::default_vad_path(&self.models_dir)),
        )
    }
}

impl Default for ModelOpts {
    fn default() -> Self {
        Self {
            size: ModelSize::Medium,
            device: Device::Cpu,
            compute_type: ComputeType::Int8,
            models_dir: PathBuf::from("./models"),
            vad: true,
            vad_model: None,
        }
    }
}

/// Parameters of one pipeline run.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so other frontends
/// (tests, batch jobs) can construct it programmatically.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Media file to subtitle.
    pub input: PathBuf,

    /// Output files are written to `<output_base>.<ext>`.
    pub output_base: PathBuf,

    pub model: ModelOpts,

    /// Optional language hint (e.g. `"en"`). `None` lets the backend auto-detect.
    pub language: Option<String>,

    /// Formats to produce. Duplicates are written once.
    pub formats: Vec<OutputType>,

    /// Where temporary waveforms go; the system temp directory when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// A config with the CLI defaults: `output` base, medium/cpu/int8, SRT + VTT.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_base: PathBuf::from("output"),
            model: ModelOpts::default(),
            language: None,
            formats: vec![OutputType::Srt, OutputType::Vtt],
            temp_dir: None,
        }
    }

    /// The path a given format is written to.
    pub fn output_path(&self, output_type: OutputType) -> PathBuf {
        append_extension(&self.output_base, output_type.extension())
    }
}

/// `movie.en` + `srt` → `movie.en.srt` (unlike `Path::with_extension`, nothing is replaced).
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
