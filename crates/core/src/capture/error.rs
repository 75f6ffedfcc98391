use thiserror::Error;

use crate::capture::domain::camera_device::{CameraPosition, DeviceType};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no {device_type:?} camera available at position {position:?}")]
    NoDevice {
        device_type: DeviceType,
        position: CameraPosition,
    },
    #[error("failed to open camera {device}: {message}")]
    Open { device: String, message: String },
    #[error("session cannot accept another input")]
    InputRejected,
    #[error("session cannot accept another output")]
    OutputRejected,
    #[error("session has no input")]
    NoInput,
    #[error("failed to read frame from {device}: {message}")]
    Read { device: String, message: String },
    #[error("failed to start capture thread: {0}")]
    Spawn(#[source] std::io::Error),
}
