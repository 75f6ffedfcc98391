use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write consent to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read the camera prompt answer: {0}")]
    Prompt(#[source] std::io::Error),
}
