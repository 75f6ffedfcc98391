use crate::shared::frame::Frame;

/// Receives admitted frames on the session queue, one call at a time.
pub trait FrameDelegate: Send {
    fn on_frame(&mut self, frame: &Frame);
}
