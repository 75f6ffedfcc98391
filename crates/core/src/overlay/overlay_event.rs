use crate::detection::domain::face_observation::FaceObservation;
use crate::permission::domain::authorization::AuthorizationState;

/// Messages from the session queue to the UI thread.
///
/// Everything that changes what is on screen travels as one of these, so
/// drawing state is only ever touched where the events are received.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayEvent {
    /// The permission gate resolved without a running session.
    Authorization(AuthorizationState),
    /// Frames are flowing. Dimensions are the camera's, before rotation.
    SessionStarted {
        width: u32,
        height: u32,
        rotation_degrees: u32,
    },
    FacesDetected {
        frame_index: usize,
        faces: Vec<FaceObservation>,
    },
    /// A failure surfaced under [`FailurePolicy::Report`].
    ///
    /// [`FailurePolicy::Report`]: crate::pipeline::failure_policy::FailurePolicy::Report
    Diagnostic(String),
}
