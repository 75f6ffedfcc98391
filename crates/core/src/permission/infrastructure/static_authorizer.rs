use crossbeam_channel::Receiver;

use crate::permission::domain::authorization::{AuthorizationState, CameraAuthorizer};

/// Authorizer with a fixed remembered status and a scripted prompt answer.
///
/// Used for unattended runs where the decision comes from the command line.
#[derive(Clone, Copy, Debug)]
pub struct StaticAuthorizer {
    status: AuthorizationState,
    answer: bool,
}

impl StaticAuthorizer {
    pub fn granted() -> Self {
        Self {
            status: AuthorizationState::Granted,
            answer: true,
        }
    }

    pub fn denied() -> Self {
        Self {
            status: AuthorizationState::Denied,
            answer: false,
        }
    }

    /// Reports `Undetermined`, then answers the prompt with `answer`.
    pub fn prompting(answer: bool) -> Self {
        Self {
            status: AuthorizationState::Undetermined,
            answer,
        }
    }
}

impl CameraAuthorizer for StaticAuthorizer {
    fn authorization_status(&self) -> AuthorizationState {
        self.status
    }

    fn request_access(&self) -> Receiver<bool> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let _ = tx.send(self.answer);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_report_their_status() {
        assert_eq!(
            StaticAuthorizer::granted().authorization_status(),
            AuthorizationState::Granted
        );
        assert_eq!(
            StaticAuthorizer::denied().authorization_status(),
            AuthorizationState::Denied
        );
        assert_eq!(
            StaticAuthorizer::prompting(true).authorization_status(),
            AuthorizationState::Undetermined
        );
    }

    #[test]
    fn test_prompt_answer_is_ready_immediately() {
        assert_eq!(StaticAuthorizer::prompting(true).request_access().recv(), Ok(true));
        assert_eq!(StaticAuthorizer::prompting(false).request_access().recv(), Ok(false));
    }
}
