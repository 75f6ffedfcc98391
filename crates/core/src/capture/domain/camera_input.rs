use crate::capture::domain::camera_device::CameraDescriptor;
use crate::capture::error::CaptureError;
use crate::shared::frame::{Frame, PixelFormat};

/// An opened camera producing frames in capture order.
pub trait CameraInput: Send {
    fn descriptor(&self) -> &CameraDescriptor;

    /// Native `(width, height)` of produced frames, before any rotation.
    fn dimensions(&self) -> (u32, u32);

    /// Selects the byte layout of subsequent frames.
    fn set_pixel_format(&mut self, format: PixelFormat) -> Result<(), CaptureError>;

    /// Blocks until the next frame. `Ok(None)` means the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}
