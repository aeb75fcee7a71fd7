mod settings;

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use attention_core::attention::domain::attention_classifier::{
    AttentionClassifier, AttentionThresholds,
};
use attention_core::attention::domain::attention_session::AttentionSession;
use attention_core::attention::domain::clock::MonotonicClock;
use attention_core::attention::domain::landmark_set::LandmarkLayout;
use attention_core::attention::domain::landmark_source::LandmarkSource;
use attention_core::attention::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use attention_core::attention::infrastructure::onnx_face_mesh_source::OnnxFaceMeshSource;
use attention_core::audio::infrastructure::wav_audio_writer::WavAudioWriter;
use attention_core::overlay::domain::overlay_renderer::OverlayRenderer;
use attention_core::overlay::infrastructure::jpeg_encoder::JpegEncoder;
use attention_core::pipeline::audio_intervention_use_case::AudioInterventionUseCase;
use attention_core::pipeline::infrastructure::threaded_monitor_executor::ThreadedMonitorExecutor;
use attention_core::pipeline::monitor_attention_use_case::{
    MonitorAttentionUseCase, MonitorConfig, OverlayOutput,
};
use attention_core::pipeline::monitor_executor::MonitorExecutor;
use attention_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use attention_core::pipeline::status_sink::{JsonLinesSink, StatusSink};
use attention_core::shared::constants::{
    FACE_DETECTION_CONFIDENCE, FACE_DETECTOR_MODEL_NAME, FACE_MESH_MODEL_NAME, LIVE_HISTORY_LIMIT,
};
use attention_core::shared::model_resolver::{self, ModelLookup};
use attention_core::shared::source_metadata::SourceSpec;
use attention_core::video::domain::video_reader::VideoReader;
use attention_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use attention_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use attention_core::video::infrastructure::image_file_writer::ImageFileWriter;

use settings::Settings;

/// Estimates visual attention from a camera or video and streams verdicts
/// as JSON lines.
#[derive(Parser)]
#[command(name = "mindless-attractor")]
struct Cli {
    /// Input video file, or capture device name with --device.
    input: String,

    /// Treat INPUT as a capture device (e.g. /dev/video0, 0, "video=Camera").
    #[arg(long)]
    device: bool,

    /// Face-mesh ONNX model; defaults to the cached or bundled copy.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face-detector ONNX model; defaults to the cached or bundled copy.
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Max |yaw| in degrees before the head counts as turned away.
    #[arg(long)]
    yaw_threshold: Option<f64>,

    /// Max |pitch| in degrees before the head counts as nodding.
    #[arg(long)]
    pitch_threshold: Option<f64>,

    /// Eye aspect ratio below which eyes count as closed.
    #[arg(long)]
    ear_threshold: Option<f64>,

    /// Seconds of continuous eye closure before it counts as distraction.
    #[arg(long)]
    closed_eyes_time: Option<f64>,

    /// Classify every Nth frame.
    #[arg(long)]
    sample_every: Option<usize>,

    /// Maximum verdicts per second.
    #[arg(long)]
    max_rate: Option<f64>,

    /// Write annotated frames as JPEGs to this directory.
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// Intervention type tag (e.g. mindless, warning, control).
    #[arg(long)]
    intervention: Option<String>,

    /// Write status events to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the input's soundtrack, altered while distracted, to this WAV
    /// file. Recorded files only.
    #[arg(long)]
    audio_out: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = merge(&cli, Settings::load());
    validate(&cli, &settings)?;

    let source = build_landmark_source(&cli, &settings)?;

    let spec = if cli.device {
        SourceSpec::Device(cli.input.clone())
    } else {
        SourceSpec::File(PathBuf::from(&cli.input))
    };
    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(&spec)?;
    log::info!(
        "Opened {}: {}x{} @ {:.2} fps ({})",
        metadata.source,
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.codec
    );

    let thresholds = settings.thresholds;
    let session = build_session(&settings, metadata.is_live());
    let config = MonitorConfig {
        sample_every: settings.sample_every,
        min_interval: 1.0 / settings.max_rate,
        media_fps: (!metadata.is_live()).then_some(metadata.fps),
    };

    let sink: Box<dyn StatusSink> = match &cli.output {
        Some(path) => Box::new(JsonLinesSink::new(BufWriter::new(File::create(path)?))),
        None => Box::new(JsonLinesSink::new(io::stdout())),
    };

    let mut monitor =
        MonitorAttentionUseCase::new(session, source, Box::new(MonotonicClock::new()), config)
            .with_sink(sink)
            .with_logger(Box::new(StdoutPipelineLogger::default()));

    let audio = match &cli.audio_out {
        Some(_) => AudioInterventionUseCase::load(
            &FfmpegAudioReader,
            Box::new(WavAudioWriter),
            Path::new(&cli.input),
        )?,
        None => None,
    };
    if let Some(audio) = &audio {
        monitor = monitor.with_sink(Box::new(audio.sink()));
    }

    if let Some(dir) = &cli.overlay_dir {
        monitor = monitor.with_overlay(OverlayOutput {
            renderer: OverlayRenderer::new(LandmarkLayout::default(), thresholds.yaw),
            writer: Box::new(ImageFileWriter::new(JpegEncoder::new(settings.jpeg_quality))),
            dir: dir.clone(),
        });
    }

    let summary = ThreadedMonitorExecutor::default().execute(reader, &metadata, &mut monitor)?;
    log::info!(
        "Done: {} verdicts, {} distractions, {} frames dropped",
        summary.frames_processed,
        summary.total_distractions,
        summary.dropped_frames
    );
    if let Some(path) = &cli.output {
        log::info!("Status events written to {}", path.display());
    }
    match (&audio, &cli.audio_out) {
        (Some(audio), Some(path)) => {
            audio.finish(path)?;
            log::info!("Processed audio written to {}", path.display());
        }
        (None, Some(_)) => log::warn!("No audio track in {}; nothing written", cli.input),
        _ => {}
    }
    Ok(())
}

/// Applies command-line overrides on top of persisted settings.
fn merge(cli: &Cli, mut settings: Settings) -> Settings {
    let t = &mut settings.thresholds;
    if let Some(v) = cli.yaw_threshold {
        t.yaw = v;
    }
    if let Some(v) = cli.pitch_threshold {
        t.pitch = v;
    }
    if let Some(v) = cli.ear_threshold {
        t.ear = v;
    }
    if let Some(v) = cli.closed_eyes_time {
        t.closed_eyes_time = v;
    }
    if let Some(v) = cli.sample_every {
        settings.sample_every = v;
    }
    if let Some(v) = cli.max_rate {
        settings.max_rate = v;
    }
    if cli.intervention.is_some() {
        settings.intervention = cli.intervention.clone();
    }
    settings
}

/// Live sessions run unbounded, so their distraction history is capped.
fn build_session(settings: &Settings, live: bool) -> AttentionSession {
    let mut session = AttentionSession::new(AttentionClassifier::new(settings.thresholds));
    if live {
        session = session.with_history_limit(LIVE_HISTORY_LIMIT);
    }
    session.set_intervention_type(settings.intervention.clone());
    session
}

fn build_landmark_source(
    cli: &Cli,
    settings: &Settings,
) -> Result<Box<dyn LandmarkSource>, Box<dyn std::error::Error>> {
    let detector_path = resolve_model(
        FACE_DETECTOR_MODEL_NAME,
        cli.detector_model.as_deref(),
        settings.detector_model_url.as_deref(),
    )?;
    let mesh_path = resolve_model(
        FACE_MESH_MODEL_NAME,
        cli.model.as_deref(),
        settings.model_url.as_deref(),
    )?;

    let detector = OnnxBlazefaceDetector::new(&detector_path, FACE_DETECTION_CONFIDENCE)?;
    Ok(Box::new(OnnxFaceMeshSource::new(&mesh_path, Box::new(detector))?))
}

fn resolve_model(
    name: &str,
    explicit: Option<&Path>,
    url: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")));
    let lookup = ModelLookup {
        explicit,
        bundled_dir: bundled.as_deref(),
        url,
    };
    let path = model_resolver::resolve(name, &lookup, Some(Box::new(download_progress)))?;
    log::info!("Using model {}", path.display());
    Ok(path)
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.device && !PathBuf::from(&cli.input).exists() {
        return Err(format!("Input file not found: {}", cli.input).into());
    }
    validate_thresholds(&settings.thresholds)?;
    if settings.sample_every == 0 {
        return Err("Sample interval must be at least 1".into());
    }
    if !(settings.max_rate.is_finite() && settings.max_rate > 0.0) {
        return Err(format!("Max rate must be positive, got {}", settings.max_rate).into());
    }
    if let Some(path) = &cli.audio_out {
        if cli.device {
            return Err("--audio-out needs a recorded input file".into());
        }
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if !is_wav {
            return Err(format!("Audio output must be a .wav file: {}", path.display()).into());
        }
    }
    if let Some(name) = &settings.intervention {
        if name.trim().is_empty() {
            return Err("Intervention type must not be empty".into());
        }
    }
    Ok(())
}

fn validate_thresholds(t: &AttentionThresholds) -> Result<(), Box<dyn std::error::Error>> {
    for (name, value) in [
        ("Yaw threshold", t.yaw),
        ("Pitch threshold", t.pitch),
        ("EAR threshold", t.ear),
        ("Closed-eyes time", t.closed_eyes_time),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(format!("{name} must be a non-negative number, got {value}").into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
