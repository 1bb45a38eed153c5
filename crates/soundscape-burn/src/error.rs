//! Error types for soundscape-burn.

use burn::record::RecorderError;
use soundscape_core::Pack;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Core error: {0}")]
    Core(#[from] soundscape_core::Error),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Tensor data error: {0}")]
    Tensor(String),

    #[error("Sampling error: {0}")]
    Sampling(String),

    #[error("Invalid temperature {0}: must be finite and > 0")]
    InvalidTemperature(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient training data for {pack}: {found} compositions, need {required}")]
    InsufficientData {
        pack: Pack,
        found: usize,
        required: usize,
    },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RecorderError> for Error {
    fn from(e: RecorderError) -> Self {
        Error::Checkpoint(format!("{:?}", e))
    }
}

/// Map a tensor readback failure.
pub(crate) fn tensor_error(e: impl core::fmt::Debug) -> Error {
    Error::Tensor(format!("{:?}", e))
}
