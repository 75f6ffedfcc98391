use std::io::{self, BufRead, Write};
use std::thread;

use crossbeam_channel::Receiver;

use crate::permission::domain::authorization::{AuthorizationState, CameraAuthorizer};
use crate::permission::error::PermissionError;
use crate::permission::infrastructure::consent_file::ConsentFile;

const PROMPT: &str = "Allow FaceCam to use the camera? [y/N] ";

/// Asks for camera access on the controlling terminal and remembers the
/// answer in a [`ConsentFile`].
pub struct TerminalPromptAuthorizer {
    consent: ConsentFile,
}

impl TerminalPromptAuthorizer {
    pub fn new(consent: ConsentFile) -> Self {
        Self { consent }
    }
}

impl CameraAuthorizer for TerminalPromptAuthorizer {
    fn authorization_status(&self) -> AuthorizationState {
        self.consent.load()
    }

    fn request_access(&self) -> Receiver<bool> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let consent = self.consent.clone();

        let spawned = thread::Builder::new()
            .name("camera-prompt".to_string())
            .spawn(move || {
                eprint!("{PROMPT}");
                let _ = io::stderr().flush();
                let granted = match read_answer(&mut io::stdin().lock()) {
                    Ok(granted) => granted,
                    Err(e) => {
                        log::warn!("{e}");
                        false
                    }
                };
                if let Err(e) = consent.store(granted) {
                    log::warn!("{e}");
                }
                let _ = tx.send(granted);
            });

        if let Err(e) = spawned {
            // The sender was moved into the failed closure, so `rx` is
            // already disconnected and reads as a denial.
            log::warn!("Could not open the camera prompt: {e}");
        }
        rx
    }
}

/// Reads one line; only an explicit yes grants access.
pub fn read_answer(reader: &mut impl BufRead) -> Result<bool, PermissionError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(PermissionError::Prompt)?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
