use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use subtitler::logging;
use subtitler::pipeline::{self, Report};
use subtitler::{
    ComputeType, Device, FfmpegExtractor, ModelOpts, ModelSize, OutputType, PipelineConfig,
    WhisperBackend,
};

fn main() -> ExitCode {
    logging::init();
    let params = Params::parse();

    let extractor = FfmpegExtractor::new(&params.ffmpeg);
    let config = params.into_config();

    match pipeline::run_with(&config, &extractor, WhisperBackend::load) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &Report) {
    for path in &report.outputs {
        println!("Subtitles written: {}", path.display());
    }
    println!(
        "Detected language: {} (confidence: {:.2})",
        report.detected_language, report.language_probability
    );
}

#[derive(Parser, Debug)]
#[command(name = "subtitler")]
#[command(about = "Generate SRT and WebVTT subtitles from a video or audio file using Whisper")]
struct Params {
    /// Input video or audio file.
    input: PathBuf,

    /// Base name of the output files (`<base>.srt`, `<base>.vtt`, ...).
    #[arg(
        short = 'o',
        long = "output_base",
        visible_alias = "output-base",
        default_value = "output"
    )]
    output_base: PathBuf,

    /// Spoken language (e.g. `en`). Auto-detected when omitted.
    #[arg(short = 'l', long = "language")]
    language: Option<String>,

    /// Whisper model size.
    #[arg(
        short = 'm',
        long = "model_size",
        visible_alias = "model-size",
        value_enum,
        default_value_t = ModelSize::Medium
    )]
    model_size: ModelSize,

    /// Device to run inference on.
    #[arg(long = "device", value_enum, default_value_t = Device::Cpu)]
    device: Device,

    /// Numeric precision of the model weights.
    #[arg(
        long = "compute_type",
        visible_alias = "compute-type",
        value_enum,
        default_value_t = ComputeType::Int8
    )]
    compute_type: ComputeType,

    /// Directory holding whisper.cpp model files.
    #[arg(long = "models-dir", env = "SUBTITLER_MODELS_DIR", default_value = "./models")]
    models_dir: PathBuf,

    /// Silero VAD model used to mute non-speech audio (default: `<models-dir>/ggml-silero-v6.2.0.bin`).
    #[arg(long = "vad-model")]
    vad_model: Option<PathBuf>,

    /// Transcribe without voice-activity filtering.
    #[arg(long = "no-vad", conflicts_with = "vad_model")]
    no_vad: bool,

    /// Output formats to write (repeatable).
    #[arg(
        short = 'f',
        long = "format",
        value_enum,
        default_values_t = [OutputType::Srt, OutputType::Vtt]
    )]
    formats: Vec<OutputType>,

    /// ffmpeg binary used for audio extraction.
    #[arg(long = "ffmpeg", env = "SUBTITLER_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Directory for the temporary waveform (system temp dir by default).
    #[arg(long = "temp-dir")]
    temp_dir: Option<PathBuf>,
}

impl Params {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            input: self.input,
            output_base: self.output_base,
            model: ModelOpts {
                size: self.model_size,
                device: self.device,
                compute_type: self.compute_type,
                models_dir: self.models_dir,
                vad: !self.no_vad,
                vad_model: self.vad_model,
            },
            language: self.language,
            formats: self.formats,
            temp_dir: self.temp_dir,
        }
    }
}
