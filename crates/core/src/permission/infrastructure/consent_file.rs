use std::fs;
use std::path::{Path, PathBuf};

use crate::permission::domain::authorization::AuthorizationState;
use crate::permission::error::PermissionError;
use crate::shared::constants::APP_DIR_NAME;

const CONSENT_FILE_NAME: &str = "camera-consent";

/// Remembers the camera decision between runs as a one-word text file.
#[derive(Clone, Debug)]
pub struct ConsentFile {
    path: PathBuf,
}

impl ConsentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/FaceCam/camera-consent`.
    pub fn in_config_dir() -> Result<Self, PermissionError> {
        dirs::config_dir()
            .map(|d| Self::new(d.join(APP_DIR_NAME).join(CONSENT_FILE_NAME)))
            .ok_or(PermissionError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files mean the user was never asked.
    pub fn load(&self) -> AuthorizationState {
        match fs::read_to_string(&self.path) {
            Ok(text) => match text.trim() {
                "granted" => AuthorizationState::Granted,
                "denied" => AuthorizationState::Denied,
                _ => AuthorizationState::Undetermined,
            },
            Err(_) => AuthorizationState::Undetermined,
        }
    }

    pub fn store(&self, granted: bool) -> Result<(), PermissionError> {
        let write_err = |source| PermissionError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, AuthorizationState::from_answer(granted).to_string())
            .map_err(write_err)
    }
}
