use thiserror::Error;

use crate::detection::infrastructure::model_resolver::ModelResolveError;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("inference runtime error: {0}")]
    Runtime(String),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("cannot run detection on a {width}x{height} frame")]
    UnsupportedFrame { width: u32, height: u32 },
    #[error(transparent)]
    Model(#[from] ModelResolveError),
}

impl DetectionError {
    pub fn runtime(e: impl std::fmt::Display) -> Self {
        DetectionError::Runtime(e.to_string())
    }
}
