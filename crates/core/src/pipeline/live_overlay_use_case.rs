use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::capture::capture_session::{CaptureSession, CaptureStats};
use crate::capture::domain::camera_device::DeviceDiscovery;
use crate::capture::error::CaptureError;
use crate::capture::preview_output::PreviewOutput;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::error::DetectionError;
use crate::overlay::detection_overlay::DetectionOverlay;
use crate::overlay::overlay_event::OverlayEvent;
use crate::permission::domain::authorization::AuthorizationState;
use crate::permission::permission_gate::PermissionGate;
use crate::pipeline::live_overlay_config::LiveOverlayConfig;
use crate::pipeline::session_logger::SharedSessionLogger;
use crate::shared::constants::SESSION_QUEUE_LABEL;
use crate::shared::serial_queue::{QueueHandle, SerialQueue};

/// Builds the detector once the camera is authorized, so a denied session
/// never loads a model.
pub type DetectorFactory =
    dyn Fn() -> Result<Box<dyn FaceDetector>, DetectionError> + Send + Sync;

/// Why a session could not be configured.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Orchestrates a live overlay session.
///
/// Owns the session queue and the capture session. `start` asks the
/// permission gate, then configures and starts capture on the session
/// queue; everything the UI needs arrives on the event receiver returned
/// by `new`.
pub struct LiveOverlayUseCase {
    gate: PermissionGate,
    session: Arc<CaptureSession>,
    setup: Arc<SessionSetup>,
    events: Sender<OverlayEvent>,
    logger: SharedSessionLogger,
    summarized: AtomicBool,
    queue: SerialQueue,
}

struct SessionSetup {
    discovery: Arc<dyn DeviceDiscovery>,
    detector_factory: Box<DetectorFactory>,
    config: LiveOverlayConfig,
    attempted: AtomicBool,
    ready: AtomicBool,
}

impl LiveOverlayUseCase {
    pub fn new(
        gate: PermissionGate,
        discovery: Arc<dyn DeviceDiscovery>,
        detector_factory: Box<DetectorFactory>,
        config: LiveOverlayConfig,
        logger: SharedSessionLogger,
    ) -> std::io::Result<(Self, Receiver<OverlayEvent>)> {
        let queue = SerialQueue::new(SESSION_QUEUE_LABEL)?;
        let (events, receiver) = crossbeam_channel::unbounded();

        let use_case = Self {
            gate,
            session: Arc::new(CaptureSession::new()),
            setup: Arc::new(SessionSetup {
                discovery,
                detector_factory,
                config,
                attempted: AtomicBool::new(false),
                ready: AtomicBool::new(false),
            }),
            events,
            logger,
            summarized: AtomicBool::new(false),
            queue,
        };
        Ok((use_case, receiver))
    }

    /// Resolves authorization and schedules session setup on the session
    /// queue. Returns the authorization state known right now, which is
    /// `Undetermined` while the user is being asked.
    ///
    /// Setup runs only after the prompt is answered. A denial ends there
    /// with an [`OverlayEvent::Authorization`]; a grant configures the
    /// session once and starts it, followed by
    /// [`OverlayEvent::SessionStarted`]. Configuration is never retried: if
    /// it failed, later calls leave the session stopped.
    pub fn start(&self) -> AuthorizationState {
        let state = self.gate.check_authorization(&self.queue);
        self.summarized.store(false, Ordering::Release);

        let gate = self.gate.clone();
        let session = self.session.clone();
        let setup = self.setup.clone();
        let queue = self.queue.handle();
        let events = self.events.clone();
        let logger = self.logger.clone();
        self.queue.dispatch(move || {
            setup.run(&gate, &session, queue, events, logger);
        });
        state
    }

    /// Stops frame delivery and logs the session summary. A detection
    /// already running finishes, and its result is still sent.
    pub fn stop(&self) {
        self.session.stop_running();
        if self.summarized.swap(true, Ordering::AcqRel) {
            return;
        }

        let stats = self.session.stats();
        if stats.captured == 0 {
            return;
        }
        log::info!(
            "Frames: {} captured, {} processed, {} dropped late",
            stats.captured,
            stats.admitted,
            stats.dropped
        );
        let mut logger = self.logger.lock().unwrap_or_else(PoisonError::into_inner);
        logger.metric("dropped_frames", stats.dropped as f64);
        logger.summary();
    }

    /// Blocks until work already queued on the session queue has run.
    ///
    /// Must not be called while the queue is held back by an open
    /// permission prompt.
    pub fn flush(&self) {
        self.queue.sync(|| ());
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn authorization(&self) -> AuthorizationState {
        self.gate.state()
    }

    /// Latest rotated frame, for drawing the live view.
    pub fn preview(&self) -> PreviewOutput {
        self.session.preview()
    }

    pub fn stats(&self) -> CaptureStats {
        self.session.stats()
    }

    pub fn config(&self) -> &LiveOverlayConfig {
        &self.setup.config
    }
}

impl Drop for LiveOverlayUseCase {
    fn drop(&mut self) {
        self.stop();
    }
}

impl SessionSetup {
    /// Runs on the session queue.
    fn run(
        &self,
        gate: &PermissionGate,
        session: &CaptureSession,
        queue: QueueHandle,
        events: Sender<OverlayEvent>,
        logger: SharedSessionLogger,
    ) {
        let state = gate.state();
        if !state.is_granted() {
            log::info!("Camera access {state}; capture will not start");
            let _ = events.send(OverlayEvent::Authorization(state));
            return;
        }

        if !self.attempted.swap(true, Ordering::AcqRel) {
            match self.configure(session, queue, events.clone(), logger) {
                Ok(()) => self.ready.store(true, Ordering::Release),
                Err(e) => {
                    self.config
                        .policy
                        .handle("Session configuration failed", &e, &events);
                }
            }
        }
        if !self.ready.load(Ordering::Acquire) {
            log::debug!("Session was never configured; capture stays stopped");
            return;
        }

        if let Err(e) = session.start_running() {
            self.config.policy.handle("Session did not start", &e, &events);
            return;
        }

        let (width, height) = session.input_dimensions().unwrap_or_default();
        let _ = events.send(OverlayEvent::SessionStarted {
            width,
            height,
            rotation_degrees: session.video_rotation(),
        });
    }

    fn configure(
        &self,
        session: &CaptureSession,
        queue: QueueHandle,
        events: Sender<OverlayEvent>,
        logger: SharedSessionLogger,
    ) -> Result<(), SetupError> {
        let config = &self.config;
        let detector = (self.detector_factory)()?;

        let device = self
            .discovery
            .default_device(config.device_type, config.position)
            .ok_or(CaptureError::NoDevice {
                device_type: config.device_type,
                position: config.position,
            })?;
        log::info!("Using camera {} ({})", device.name, device.id);

        session.add_input(self.discovery.open(&device)?)?;
        session.set_video_rotation(config.video_rotation);

        let delegate =
            DetectionOverlay::new(detector, config.orientation, config.policy, events, logger);
        session.add_output(config.output, Box::new(delegate), queue)?;
        Ok(())
    }
}
