use crossbeam_channel::Receiver;

/// Whether the user allowed camera use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationState {
    Granted,
    Denied,
    Undetermined,
}

impl AuthorizationState {
    pub fn from_answer(granted: bool) -> Self {
        if granted {
            AuthorizationState::Granted
        } else {
            AuthorizationState::Denied
        }
    }

    pub fn is_granted(self) -> bool {
        self == AuthorizationState::Granted
    }

    pub fn is_resolved(self) -> bool {
        self != AuthorizationState::Undetermined
    }
}

impl std::fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationState::Granted => write!(f, "granted"),
            AuthorizationState::Denied => write!(f, "denied"),
            AuthorizationState::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// Source of camera authorization: a remembered decision plus a way to ask.
pub trait CameraAuthorizer: Send + Sync {
    /// The remembered decision, or `Undetermined` if the user was never asked.
    fn authorization_status(&self) -> AuthorizationState;

    /// Asks the user once. The answer arrives on the returned channel; a
    /// channel that disconnects without an answer counts as a denial.
    fn request_access(&self) -> Receiver<bool>;
}
