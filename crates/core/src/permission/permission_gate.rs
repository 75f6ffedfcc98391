use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crate::permission::domain::authorization::{AuthorizationState, CameraAuthorizer};
use crate::shared::serial_queue::QueueHandle;

/// Resolves camera authorization once per session and holds the session
/// queue back while the user is being asked.
///
/// The first resolved state sticks: later answers or status changes within
/// the same session are ignored.
#[derive(Clone)]
pub struct PermissionGate {
    authorizer: Arc<dyn CameraAuthorizer>,
    state: Arc<Mutex<AuthorizationState>>,
    prompted: Arc<AtomicBool>,
}

impl PermissionGate {
    pub fn new(authorizer: Arc<dyn CameraAuthorizer>) -> Self {
        Self {
            authorizer,
            state: Arc::new(Mutex::new(AuthorizationState::Undetermined)),
            prompted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reads the remembered decision. When there is none, suspends `queue`,
    /// asks the user, and resumes `queue` once the answer arrives.
    ///
    /// Returns the state as known right now, so `Undetermined` while the
    /// prompt is open.
    pub fn check_authorization(&self, queue: &QueueHandle) -> AuthorizationState {
        let current = self.state();
        if current.is_resolved() {
            return current;
        }

        match self.authorizer.authorization_status() {
            AuthorizationState::Undetermined => {
                if !self.prompted.swap(true, Ordering::SeqCst) {
                    self.request_permission(queue);
                }
                self.state()
            }
            resolved => {
                settle(&self.state, resolved);
                self.state()
            }
        }
    }

    pub fn state(&self) -> AuthorizationState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_granted(&self) -> bool {
        self.state().is_granted()
    }

    fn request_permission(&self, queue: &QueueHandle) {
        log::info!("Camera authorization undetermined, asking the user");
        queue.suspend();

        let answer = self.authorizer.request_access();
        let state = self.state.clone();
        let waiting_queue = queue.clone();

        let spawned = thread::Builder::new()
            .name("permission-prompt".to_string())
            .spawn(move || {
                let granted = answer.recv().unwrap_or(false);
                let resolved = AuthorizationState::from_answer(granted);
                log::info!("Camera authorization {resolved}");
                settle(&state, resolved);
                waiting_queue.resume();
            });

        if let Err(e) = spawned {
            log::warn!("Could not wait for the permission prompt: {e}");
            settle(&self.state, AuthorizationState::Denied);
            queue.resume();
        }
    }
}

/// Records `resolved` unless a decision was already recorded.
fn settle(slot: &Mutex<AuthorizationState>, resolved: AuthorizationState) {
    let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if !state.is_resolved() {
        *state = resolved;
    }
}
