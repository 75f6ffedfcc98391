use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::geometry::NormalizedRect;

/// One face found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    /// Unit-space box, top-left origin, relative to the detected frame.
    pub bounding_box: NormalizedRect,
    pub confidence: f64,
    pub landmarks: FaceLandmarks,
}

impl FaceObservation {
    pub fn new(bounding_box: NormalizedRect, confidence: f64) -> Self {
        Self {
            bounding_box,
            confidence,
            landmarks: FaceLandmarks::default(),
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = landmarks;
        self
    }
}
