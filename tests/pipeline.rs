use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use subtitler::pipeline::run_with;
use subtitler::{
    Backend, Error, Extractor, FfmpegExtractor, ModelOpts, OutputType, PipelineConfig, Result,
    Segment, TranscriptionInfo,
};

/// What the fake backend observed during `transcribe`.
#[derive(Debug, Default)]
struct Seen {
    waveform: Option<PathBuf>,
    waveform_existed: bool,
    language: Option<String>,
}

struct FakeBackend {
    segments: Vec<Result<Segment>>,
    fail_transcribe: bool,
    reads_audio: bool,
    info: TranscriptionInfo,
    seen: Rc<RefCell<Seen>>,
    dropped: Rc<Cell<bool>>,
}

impl FakeBackend {
    fn new(segments: Vec<Result<Segment>>) -> Self {
        Self {
            segments,
            fail_transcribe: false,
            reads_audio: true,
            info: TranscriptionInfo {
                language: "en".to_string(),
                language_probability: 0.97,
            },
            seen: Rc::default(),
            dropped: Rc::default(),
        }
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

impl Backend for FakeBackend {
    type Segments = std::vec::IntoIter<Result<Segment>>;

    fn reads_directly(&self, _path: &Path) -> bool {
        self.reads_audio
    }

    fn transcribe(
        &mut self,
        waveform: &Path,
        language: Option<&str>,
    ) -> Result<(Self::Segments, TranscriptionInfo)> {
        {
            let mut seen = self.seen.borrow_mut();
            seen.waveform = Some(waveform.to_path_buf());
            seen.waveform_existed = waveform.is_file();
            seen.language = language.map(str::to_string);
        }
        if self.fail_transcribe {
            return Err(Error::Transcription("engine exploded".to_string()));
        }
        Ok((std::mem::take(&mut self.segments).into_iter(), self.info.clone()))
    }
}

/// Writes a placeholder waveform and counts invocations.
#[derive(Default)]
struct FakeExtractor {
    calls: Cell<usize>,
    fail: bool,
}

impl Extractor for FakeExtractor {
    fn extract(&self, _input: &Path, output: &Path) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(Error::ExtractionFailed {
                tool: "fake".to_string(),
                status: Some(1),
                diagnostics: "Invalid data found when processing input".to_string(),
            });
        }
        fs::write(output, b"RIFF")?;
        Ok(())
    }
}

struct Workspace {
    _root: tempfile::TempDir,
    input_dir: PathBuf,
    out_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl Workspace {
    fn new() -> anyhow::Result<Self> {
        let root = tempfile::tempdir()?;
        let input_dir = root.path().join("in");
        let out_dir = root.path().join("out");
        let tmp_dir = root.path().join("tmp");
        for dir in [&input_dir, &out_dir, &tmp_dir] {
            fs::create_dir(dir)?;
        }
        Ok(Self {
            _root: root,
            input_dir,
            out_dir,
            tmp_dir,
        })
    }

    /// A config for `name` (created as a small file) writing to `out/subs.*`.
    fn config(&self, name: &str) -> anyhow::Result<PipelineConfig> {
        let input = self.input_dir.join(name);
        fs::write(&input, b"not really media")?;

        let mut config = PipelineConfig::new(input);
        config.output_base = self.out_dir.join("subs");
        config.temp_dir = Some(self.tmp_dir.clone());
        Ok(config)
    }

    fn out_entries(&self) -> anyhow::Result<usize> {
        Ok(fs::read_dir(&self.out_dir)?.count())
    }

    fn tmp_entries(&self) -> anyhow::Result<usize> {
        Ok(fs::read_dir(&self.tmp_dir)?.count())
    }
}

fn hello_world() -> Vec<Result<Segment>> {
    vec![Ok(Segment::new(0.5, 1.8, " Hello world"))]
}

#[test]
fn video_input_is_extracted_transcribed_and_written() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("clip.mp4")?;
    let extractor = FakeExtractor::default();

    let backend = FakeBackend::new(hello_world());
    let seen = backend.seen.clone();
    let dropped = backend.dropped.clone();

    let report = run_with(&config, &extractor, |_: &ModelOpts| Ok(backend))?;

    assert_eq!(extractor.calls.get(), 1);
    assert_eq!(report.detected_language, "en");
    assert_eq!(report.segments, 1);
    assert_eq!(
        report.outputs,
        vec![ws.out_dir.join("subs.srt"), ws.out_dir.join("subs.vtt")]
    );

    assert_eq!(
        fs::read_to_string(ws.out_dir.join("subs.srt"))?,
        "1\n00:00:00,500 --> 00:00:01,800\nHello world\n\n"
    );
    assert_eq!(
        fs::read_to_string(ws.out_dir.join("subs.vtt"))?,
        "WEBVTT\n\n00:00:00.500 --> 00:00:01.800\nHello world\n\n"
    );

    let seen = seen.borrow();
    let waveform = seen.waveform.as_ref().expect("backend saw a waveform");
    assert!(seen.waveform_existed);
    assert!(waveform.starts_with(&ws.tmp_dir));
    assert_eq!(ws.tmp_entries()?, 0, "temporary waveform must be removed");
    assert!(dropped.get());
    Ok(())
}

#[test]
fn empty_transcription_writes_empty_subtitles() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("silence.mp4")?;

    let report = run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| {
        Ok(FakeBackend::new(Vec::new()))
    })?;

    assert_eq!(report.segments, 0);
    assert_eq!(fs::read(ws.out_dir.join("subs.srt"))?.len(), 0);
    assert_eq!(fs::read_to_string(ws.out_dir.join("subs.vtt"))?, "WEBVTT\n\n");
    Ok(())
}

#[test]
fn audio_input_skips_extraction() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("speech.WAV")?;
    let extractor = FakeExtractor::default();

    let backend = FakeBackend::new(hello_world());
    let seen = backend.seen.clone();

    run_with(&config, &extractor, |_: &ModelOpts| Ok(backend))?;

    assert_eq!(extractor.calls.get(), 0);
    assert_eq!(seen.borrow().waveform.as_deref(), Some(config.input.as_path()));
    assert_eq!(ws.tmp_entries()?, 0);
    assert!(config.input.is_file(), "passthrough input must not be deleted");
    Ok(())
}

#[test]
fn audio_the_backend_cannot_read_is_extracted() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("voice.opus")?;
    let extractor = FakeExtractor::default();

    let mut backend = FakeBackend::new(hello_world());
    backend.reads_audio = false;
    let seen = backend.seen.clone();

    run_with(&config, &extractor, |_: &ModelOpts| Ok(backend))?;

    assert_eq!(extractor.calls.get(), 1);
    let seen = seen.borrow();
    let waveform = seen.waveform.as_ref().expect("backend saw a waveform");
    assert!(waveform.starts_with(&ws.tmp_dir));
    assert_eq!(ws.tmp_entries()?, 0);
    assert!(ws.out_dir.join("subs.srt").is_file());
    Ok(())
}

#[test]
fn language_hint_reaches_backend() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let mut config = ws.config("interview.mkv")?;
    config.language = Some("fr".to_string());
    config.formats = vec![OutputType::Srt];

    let mut backend = FakeBackend::new(hello_world());
    backend.info = TranscriptionInfo {
        language: "fr".to_string(),
        language_probability: 1.0,
    };
    let seen = backend.seen.clone();

    let report = run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| Ok(backend))?;

    assert_eq!(seen.borrow().language.as_deref(), Some("fr"));
    assert_eq!(report.detected_language, "fr");
    assert_eq!(report.outputs, vec![ws.out_dir.join("subs.srt")]);
    assert!(!ws.out_dir.join("subs.vtt").exists());
    Ok(())
}

#[test]
fn json_output_is_written_alongside_subtitles() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let mut config = ws.config("clip.mov")?;
    config.formats = vec![OutputType::Srt, OutputType::Vtt, OutputType::Json];

    run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| {
        Ok(FakeBackend::new(hello_world()))
    })?;

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.out_dir.join("subs.json"))?)?;
    assert_eq!(json[0]["text"], "Hello world");
    assert_eq!(ws.out_entries()?, 3);
    Ok(())
}

#[test]
fn missing_ffmpeg_fails_without_outputs() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("clip.mp4")?;
    let extractor = FfmpegExtractor::new("subtitler-test-no-such-ffmpeg");

    let backend = FakeBackend::new(hello_world());
    let dropped = backend.dropped.clone();

    let err = run_with(&config, &extractor, |_: &ModelOpts| Ok(backend)).unwrap_err();

    assert!(matches!(err, Error::ToolNotFound { .. }), "{err:?}");
    assert_eq!(ws.out_entries()?, 0);
    assert_eq!(ws.tmp_entries()?, 0);
    assert!(dropped.get());
    Ok(())
}

#[test]
fn extraction_failure_releases_everything() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("broken.avi")?;
    let extractor = FakeExtractor {
        fail: true,
        ..FakeExtractor::default()
    };

    let backend = FakeBackend::new(hello_world());
    let seen = backend.seen.clone();
    let dropped = backend.dropped.clone();

    let err = run_with(&config, &extractor, |_: &ModelOpts| Ok(backend)).unwrap_err();

    match err {
        Error::ExtractionFailed { diagnostics, .. } => {
            assert!(diagnostics.contains("Invalid data"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(seen.borrow().waveform.is_none(), "backend must not run");
    assert_eq!(ws.out_entries()?, 0);
    assert_eq!(ws.tmp_entries()?, 0);
    assert!(dropped.get());
    Ok(())
}

#[test]
fn model_load_failure_stops_before_extraction() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("clip.mp4")?;
    let extractor = FakeExtractor::default();

    let err = run_with(&config, &extractor, |_: &ModelOpts| -> Result<FakeBackend> {
        Err(Error::ModelLoad("no such model".to_string()))
    })
    .unwrap_err();

    assert!(matches!(err, Error::ModelLoad(_)));
    assert_eq!(extractor.calls.get(), 0);
    assert_eq!(ws.out_entries()?, 0);
    assert_eq!(ws.tmp_entries()?, 0);
    Ok(())
}

#[test]
fn loader_receives_model_options() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let mut config = ws.config("clip.mp4")?;
    config.model.size = subtitler::ModelSize::Tiny;
    config.model.compute_type = subtitler::ComputeType::Float32;

    run_with(&config, &FakeExtractor::default(), |opts: &ModelOpts| {
        assert_eq!(opts.size, subtitler::ModelSize::Tiny);
        assert_eq!(opts.compute_type, subtitler::ComputeType::Float32);
        Ok(FakeBackend::new(Vec::new()))
    })?;
    Ok(())
}

#[test]
fn transcription_failure_releases_everything() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("clip.mp4")?;

    let mut backend = FakeBackend::new(hello_world());
    backend.fail_transcribe = true;
    let dropped = backend.dropped.clone();

    let err = run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| Ok(backend))
        .unwrap_err();

    assert!(matches!(err, Error::Transcription(_)));
    assert_eq!(ws.out_entries()?, 0);
    assert_eq!(ws.tmp_entries()?, 0);
    assert!(dropped.get());
    Ok(())
}

#[test]
fn error_mid_sequence_leaves_no_subtitle_files() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("clip.mp4")?;

    let backend = FakeBackend::new(vec![
        Ok(Segment::new(0.0, 1.0, "first")),
        Err(Error::Transcription("decoder stalled".to_string())),
        Ok(Segment::new(2.0, 3.0, "never written")),
    ]);
    let dropped = backend.dropped.clone();

    let err = run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| Ok(backend))
        .unwrap_err();

    assert!(err.to_string().contains("decoder stalled"));
    assert_eq!(ws.out_entries()?, 0);
    assert_eq!(ws.tmp_entries()?, 0);
    assert!(dropped.get());
    Ok(())
}

#[test]
fn missing_input_is_invalid_input() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let mut config = ws.config("clip.mp4")?;
    config.input = ws.input_dir.join("does-not-exist.mp4");
    let extractor = FakeExtractor::default();

    let backend = FakeBackend::new(hello_world());
    let dropped = backend.dropped.clone();

    let err = run_with(&config, &extractor, |_: &ModelOpts| Ok(backend)).unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(extractor.calls.get(), 0);
    assert_eq!(ws.out_entries()?, 0);
    assert!(dropped.get());
    Ok(())
}

#[test]
fn no_formats_is_invalid_input() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let mut config = ws.config("clip.mp4")?;
    config.formats.clear();

    let err = run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| {
        Ok(FakeBackend::new(hello_world()))
    })
    .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    Ok(())
}

#[test]
fn rerun_overwrites_previous_outputs() -> anyhow::Result<()> {
    let ws = Workspace::new()?;
    let config = ws.config("clip.mp4")?;
    fs::write(ws.out_dir.join("subs.srt"), "stale")?;

    for _ in 0..2 {
        run_with(&config, &FakeExtractor::default(), |_: &ModelOpts| {
            Ok(FakeBackend::new(hello_world()))
        })?;
    }

    assert_eq!(
        fs::read_to_string(ws.out_dir.join("subs.srt"))?,
        "1\n00:00:00,500 --> 00:00:01,800\nHello world\n\n"
    );
    assert_eq!(ws.out_entries()?, 2);
    Ok(())
}
