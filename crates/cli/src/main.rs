mod snapshot;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use crossbeam_channel::RecvTimeoutError;

use facecam_core::capture::domain::camera_device::DeviceDiscovery;
use facecam_core::capture::infrastructure::ffmpeg_device_discovery::{
    FfmpegDeviceDiscovery, FileReplayDiscovery,
};
use facecam_core::detection::domain::face_detector::FaceDetector;
use facecam_core::detection::domain::image_orientation::ImageOrientation;
use facecam_core::detection::error::DetectionError;
use facecam_core::detection::infrastructure::model_resolver::{self, ModelSource};
use facecam_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use facecam_core::overlay::highlight_shape::StrokeStyle;
use facecam_core::overlay::overlay_event::OverlayEvent;
use facecam_core::overlay::overlay_screen::OverlayScreen;
use facecam_core::overlay::preview_surface::PreviewGravity;
use facecam_core::permission::domain::authorization::CameraAuthorizer;
use facecam_core::permission::infrastructure::consent_file::ConsentFile;
use facecam_core::permission::infrastructure::static_authorizer::StaticAuthorizer;
use facecam_core::permission::infrastructure::terminal_prompt_authorizer::TerminalPromptAuthorizer;
use facecam_core::permission::permission_gate::PermissionGate;
use facecam_core::pipeline::failure_policy::FailurePolicy;
use facecam_core::pipeline::live_overlay_config::LiveOverlayConfig;
use facecam_core::pipeline::live_overlay_use_case::LiveOverlayUseCase;
use facecam_core::pipeline::session_logger::{self, StdoutSessionLogger};
use facecam_core::shared::constants::{DEFAULT_CAPTION, VIDEO_ROTATION_DEGREES};
use facecam_core::shared::geometry::ScreenRect;

const EVENT_POLL: Duration = Duration::from_millis(200);
const PROGRESS_EVERY: usize = 30;

/// Live camera face highlighting without a window.
#[derive(Parser)]
#[command(name = "facecam")]
struct Cli {
    /// Camera to open: a /dev/videoN node, an avfoundation index or a dshow name.
    #[arg(long, conflicts_with = "source")]
    device: Option<String>,

    /// Replay a video file as the camera, paced to its frame rate.
    #[arg(long)]
    source: Option<PathBuf>,

    /// How camera access is decided.
    #[arg(long, value_enum, default_value = "prompt")]
    camera_access: CameraAccess,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Clockwise correction applied to frames, in degrees (multiple of 90).
    #[arg(long, default_value_t = VIDEO_ROTATION_DEGREES)]
    rotation: u32,

    /// Orientation the detector assumes for rotated frames.
    #[arg(long, default_value = "up")]
    orientation: ImageOrientation,

    /// Failure handling: silent or report.
    #[arg(long, default_value = "silent")]
    policy: FailurePolicy,

    /// How video fills the screen: resize, aspect or aspect-fill.
    #[arg(long, default_value = "aspect-fill")]
    gravity: PreviewGravity,

    /// Screen size used to place highlights, as WIDTHxHEIGHT.
    #[arg(long, default_value = "390x844", value_parser = parse_screen)]
    screen: (u32, u32),

    /// Stop after this many processed frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Write the last preview frame with its highlights to this PNG.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CameraAccess {
    /// Use the remembered answer, asking on the terminal the first time.
    Prompt,
    Granted,
    Denied,
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
    validate(&cli)?;

    let (width, height) = cli.screen;
    let mut screen = OverlayScreen::new(
        ScreenRect::new(0.0, 0.0, width as f64, height as f64),
        cli.gravity,
        StrokeStyle::default(),
        DEFAULT_CAPTION,
    );

    let config = LiveOverlayConfig {
        video_rotation: cli.rotation,
        orientation: cli.orientation,
        policy: cli.policy,
        ..LiveOverlayConfig::default()
    };
    let confidence = cli.confidence;
    let (use_case, events) = LiveOverlayUseCase::new(
        PermissionGate::new(build_authorizer(cli.camera_access)?),
        build_discovery(&cli),
        Box::new(move || build_detector(confidence)),
        config,
        session_logger::shared(StdoutSessionLogger::new(PROGRESS_EVERY)),
    )?;

    use_case.start();

    let mut processed = 0usize;
    let mut session_seen = false;
    loop {
        let event = match events.recv_timeout(EVENT_POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                if session_seen && !use_case.is_running() {
                    log::info!("Camera source ended");
                    break;
                }
                if !session_seen && use_case.authorization().is_granted() {
                    use_case.flush();
                    if !use_case.is_running() && events.is_empty() {
                        return Err("camera session did not start".into());
                    }
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match &event {
            OverlayEvent::Authorization(state) => {
                log::info!("Camera access {state}; nothing to show");
                return Ok(());
            }
            OverlayEvent::SessionStarted {
                width,
                height,
                rotation_degrees,
            } => {
                session_seen = true;
                log::info!("Camera running at {width}x{height}, rotated {rotation_degrees} degrees");
            }
            OverlayEvent::Diagnostic(message) => eprintln!("{message}"),
            OverlayEvent::FacesDetected { .. } => processed += 1,
        }

        if let Some(change) = screen.handle(event) {
            let index = screen.last_frame_index().unwrap_or_default();
            if change.removed != 0 || change.added != 0 {
                log::info!(
                    "Frame {index}: {} highlight(s) ({} removed)",
                    change.added,
                    change.removed
                );
            }
            for shape in screen.shapes() {
                log::debug!(
                    "  [{:.1}, {:.1}, {:.1}x{:.1}]",
                    shape.rect.x,
                    shape.rect.y,
                    shape.rect.width,
                    shape.rect.height
                );
            }
        }

        if cli.max_frames.is_some_and(|max| processed >= max) {
            break;
        }
    }

    use_case.stop();
    for event in events.try_iter() {
        screen.handle(event);
    }

    if let Some(ref path) = cli.snapshot {
        let frame = use_case.preview().peek_latest();
        snapshot::write_snapshot(path, &screen, frame.as_ref())?;
        log::info!("Snapshot written to {}", path.display());
    }

    Ok(())
}

fn build_authorizer(
    access: CameraAccess,
) -> Result<Arc<dyn CameraAuthorizer>, Box<dyn std::error::Error>> {
    let authorizer: Arc<dyn CameraAuthorizer> = match access {
        CameraAccess::Prompt => Arc::new(TerminalPromptAuthorizer::new(
            ConsentFile::in_config_dir()?,
        )),
        CameraAccess::Granted => Arc::new(StaticAuthorizer::granted()),
        CameraAccess::Denied => Arc::new(StaticAuthorizer::denied()),
    };
    Ok(authorizer)
}

fn build_discovery(cli: &Cli) -> Arc<dyn DeviceDiscovery> {
    match (&cli.source, &cli.device) {
        (Some(path), _) => Arc::new(FileReplayDiscovery::new(path)),
        (None, Some(device)) => Arc::new(FfmpegDeviceDiscovery::with_device(device.clone())),
        (None, None) => Arc::new(FfmpegDeviceDiscovery::new()),
    }
}

fn build_detector(confidence: f64) -> Result<Box<dyn FaceDetector>, DetectionError> {
    let source = ModelSource::default();
    log::info!("Resolving model: {}", source.name);
    let model_path = model_resolver::resolve_face_model(&source, Some(Box::new(download_progress)))?;
    Ok(Box::new(OnnxYoloDetector::new(&model_path, confidence)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref source) = cli.source {
        if !source.is_file() {
            return Err(format!("Source file not found: {}", source.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.rotation % 90 != 0 {
        return Err(format!("Rotation must be a multiple of 90, got {}", cli.rotation).into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    if let Some(ref path) = cli.snapshot {
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(format!("Snapshot must be a .png file, got {}", path.display()).into());
        }
    }
    Ok(())
}

fn parse_screen(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("screen size must be non-zero, got '{s}'"));
    }
    Ok((w, h))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
