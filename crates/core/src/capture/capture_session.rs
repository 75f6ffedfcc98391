use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::capture::domain::camera_input::CameraInput;
use crate::capture::domain::frame_delegate::FrameDelegate;
use crate::capture::domain::video_data_output::VideoDataOutput;
use crate::capture::error::CaptureError;
use crate::capture::frame_admission::FrameAdmission;
use crate::capture::preview_output::PreviewOutput;
use crate::shared::frame::Frame;
use crate::shared::serial_queue::QueueHandle;

/// Binds one camera input to the preview slot and one frame delegate.
///
/// Layout: `capture thread → rotate → preview slot`
///                                 `→ admission → session queue → delegate`
///
/// The capture thread owns the input while running and hands it back when
/// stopped, so a session can be restarted.
pub struct CaptureSession {
    input: Mutex<Option<Box<dyn CameraInput>>>,
    input_dimensions: Mutex<Option<(u32, u32)>>,
    output: Mutex<Option<OutputBinding>>,
    preview: PreviewOutput,
    video_rotation: AtomicU32,
    running: Arc<AtomicBool>,
    capture_thread: Mutex<Option<JoinHandle<Box<dyn CameraInput>>>>,
    counters: Arc<CaptureCounters>,
}

#[derive(Clone)]
struct OutputBinding {
    settings: VideoDataOutput,
    delegate: Arc<Mutex<Box<dyn FrameDelegate>>>,
    queue: QueueHandle,
    admission: FrameAdmission,
}

#[derive(Default)]
struct CaptureCounters {
    captured: AtomicUsize,
    admitted: AtomicUsize,
    dropped: AtomicUsize,
}

/// Frame counts since the session was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub captured: usize,
    pub admitted: usize,
    pub dropped: usize,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(None),
            input_dimensions: Mutex::new(None),
            output: Mutex::new(None),
            preview: PreviewOutput::new(),
            video_rotation: AtomicU32::new(0),
            running: Arc::new(AtomicBool::new(false)),
            capture_thread: Mutex::new(None),
            counters: Arc::new(CaptureCounters::default()),
        }
    }

    pub fn can_add_input(&self) -> bool {
        lock(&self.input).is_none() && lock(&self.capture_thread).is_none()
    }

    pub fn add_input(&self, input: Box<dyn CameraInput>) -> Result<(), CaptureError> {
        if !self.can_add_input() {
            return Err(CaptureError::InputRejected);
        }
        log::info!("Camera input attached: {}", input.descriptor().name);
        *lock(&self.input_dimensions) = Some(input.dimensions());
        *lock(&self.input) = Some(input);
        Ok(())
    }

    pub fn can_add_output(&self) -> bool {
        lock(&self.output).is_none() && !self.is_running()
    }

    /// Routes admitted frames to `delegate`, run on `queue`.
    pub fn add_output(
        &self,
        settings: VideoDataOutput,
        delegate: Box<dyn FrameDelegate>,
        queue: QueueHandle,
    ) -> Result<(), CaptureError> {
        if !self.can_add_output() {
            return Err(CaptureError::OutputRejected);
        }
        *lock(&self.output) = Some(OutputBinding {
            settings,
            delegate: Arc::new(Mutex::new(delegate)),
            queue,
            admission: FrameAdmission::new(),
        });
        Ok(())
    }

    /// Clockwise rotation applied to every frame before it leaves the session.
    /// Takes effect on the next start.
    pub fn set_video_rotation(&self, degrees: u32) {
        self.video_rotation.store(degrees % 360, Ordering::Relaxed);
    }

    pub fn video_rotation(&self) -> u32 {
        self.video_rotation.load(Ordering::Relaxed)
    }

    /// Native size of the attached input, before rotation.
    pub fn input_dimensions(&self) -> Option<(u32, u32)> {
        *lock(&self.input_dimensions)
    }

    /// Size of delivered frames, after rotation.
    pub fn output_dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = (*lock(&self.input_dimensions))?;
        if (self.video_rotation() / 90) % 2 == 1 {
            Some((h, w))
        } else {
            Some((w, h))
        }
    }

    pub fn preview(&self) -> PreviewOutput {
        self.preview.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn start_running(&self) -> Result<(), CaptureError> {
        if self.is_running() {
            return Ok(());
        }
        self.reclaim_input();

        let mut input = lock(&self.input).take().ok_or(CaptureError::NoInput)?;
        let binding = lock(&self.output).clone();
        if let Some(ref binding) = binding {
            if let Err(e) = input.set_pixel_format(binding.settings.pixel_format) {
                *lock(&self.input) = Some(input);
                return Err(e);
            }
        }

        let rotation = self.video_rotation();
        let running = self.running.clone();
        let preview = self.preview.clone();
        let counters = self.counters.clone();

        self.running.store(true, Ordering::Release);
        let spawned = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || {
                capture_loop(
                    &mut input,
                    binding.as_ref(),
                    rotation,
                    &running,
                    &preview,
                    &counters,
                );
                running.store(false, Ordering::Release);
                input
            });

        match spawned {
            Ok(handle) => {
                *lock(&self.capture_thread) = Some(handle);
                log::info!("Capture session running");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(CaptureError::Spawn(e))
            }
        }
    }

    /// Stops frame delivery. A detection already running on the session
    /// queue is not interrupted.
    pub fn stop_running(&self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.reclaim_input();
        if was_running {
            log::info!("Capture session stopped");
        }
    }

    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            captured: self.counters.captured.load(Ordering::Relaxed),
            admitted: self.counters.admitted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Joins a finished or stopping capture thread and takes its input back.
    fn reclaim_input(&self) {
        let handle = lock(&self.capture_thread).take();
        if let Some(handle) = handle {
            match handle.join() {
                Ok(input) => *lock(&self.input) = Some(input),
                Err(_) => log::error!("Capture thread panicked"),
            }
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_running();
    }
}

fn capture_loop(
    input: &mut Box<dyn CameraInput>,
    binding: Option<&OutputBinding>,
    rotation: u32,
    running: &AtomicBool,
    preview: &PreviewOutput,
    counters: &CaptureCounters,
) {
    while running.load(Ordering::Acquire) {
        match input.next_frame() {
            Ok(Some(frame)) => deliver(frame.rotated(rotation), binding, preview, counters),
            Ok(None) => {
                log::info!("Camera source {} ended", input.descriptor().name);
                break;
            }
            Err(e) => {
                log::warn!("{e}");
                break;
            }
        }
    }
}

fn deliver(
    frame: Frame,
    binding: Option<&OutputBinding>,
    preview: &PreviewOutput,
    counters: &CaptureCounters,
) {
    counters.captured.fetch_add(1, Ordering::Relaxed);

    let Some(binding) = binding else {
        preview.publish(frame);
        return;
    };
    preview.publish(frame.clone());

    let permit = if binding.settings.always_discards_late_frames {
        match binding.admission.try_admit() {
            Some(permit) => Some(permit),
            None => {
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                log::trace!("Dropped late frame {}", frame.index());
                return;
            }
        }
    } else {
        None
    };

    counters.admitted.fetch_add(1, Ordering::Relaxed);
    let delegate = binding.delegate.clone();
    binding.queue.dispatch(move || {
        let _permit = permit;
        lock(&delegate).on_frame(&frame);
    });
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
