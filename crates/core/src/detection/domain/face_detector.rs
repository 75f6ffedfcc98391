use crate::detection::domain::face_observation::FaceObservation;
use crate::detection::error::DetectionError;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations may keep per-frame scratch state, hence `&mut self`.
/// Observations are normalized to the frame that was passed in.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceObservation>, DetectionError>;
}
