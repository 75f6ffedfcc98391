use crossbeam_channel::{Receiver, Sender};

use facecam_core::permission::domain::authorization::{AuthorizationState, CameraAuthorizer};

/// Where the UI answers a camera prompt.
pub type PromptResponder = Sender<bool>;

/// Asks for camera access through an in-window dialog.
///
/// `request_access` hands a responder to the UI thread, which shows the
/// dialog and sends the answer back. Closing the window without answering
/// drops the responder, which reads as a denial.
pub struct DialogAuthorizer {
    remembered: AuthorizationState,
    prompts: Sender<PromptResponder>,
}

impl DialogAuthorizer {
    /// Returns the authorizer and the receiver the UI polls for prompts.
    pub fn new(remembered: AuthorizationState) -> (Self, Receiver<PromptResponder>) {
        let (prompts, requests) = crossbeam_channel::unbounded();
        (
            Self {
                remembered,
                prompts,
            },
            requests,
        )
    }
}

impl CameraAuthorizer for DialogAuthorizer {
    fn authorization_status(&self) -> AuthorizationState {
        self.remembered
    }

    fn request_access(&self) -> Receiver<bool> {
        let (responder, answer) = crossbeam_channel::bounded(1);
        if self.prompts.send(responder).is_err() {
            log::warn!("No window to ask for camera access");
        }
        answer
    }
}
