use crate::shared::frame::PixelFormat;

/// Settings of the session output that feeds frames to a delegate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoDataOutput {
    pub pixel_format: PixelFormat,
    /// Drop a frame that arrives while the previous one is still being
    /// processed instead of queueing it.
    pub always_discards_late_frames: bool,
}

impl Default for VideoDataOutput {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Bgra32,
            always_discards_late_frames: true,
        }
    }
}
