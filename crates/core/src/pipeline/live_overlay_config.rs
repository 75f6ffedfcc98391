use crate::capture::domain::camera_device::{CameraPosition, DeviceType};
use crate::capture::domain::video_data_output::VideoDataOutput;
use crate::detection::domain::image_orientation::ImageOrientation;
use crate::pipeline::failure_policy::FailurePolicy;
use crate::shared::constants::VIDEO_ROTATION_DEGREES;

/// How a live overlay session picks its camera and treats its frames.
///
/// The default is the phone-style setup: back dual-wide camera, a fixed
/// 90 degree correction, BGRA frames with late ones discarded, upright
/// detection and silent failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveOverlayConfig {
    pub device_type: DeviceType,
    pub position: CameraPosition,
    pub video_rotation: u32,
    pub output: VideoDataOutput,
    pub orientation: ImageOrientation,
    pub policy: FailurePolicy,
}

impl Default for LiveOverlayConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::DualWide,
            position: CameraPosition::Back,
            video_rotation: VIDEO_ROTATION_DEGREES,
            output: VideoDataOutput::default(),
            orientation: ImageOrientation::Up,
            policy: FailurePolicy::Silent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::PixelFormat;

    #[test]
    fn test_default_matches_phone_setup() {
        let config = LiveOverlayConfig::default();
        assert_eq!(config.device_type, DeviceType::DualWide);
        assert_eq!(config.position, CameraPosition::Back);
        assert_eq!(config.video_rotation, 90);
        assert_eq!(config.output.pixel_format, PixelFormat::Bgra32);
        assert!(config.output.always_discards_late_frames);
        assert_eq!(config.policy, FailurePolicy::Silent);
    }
}
