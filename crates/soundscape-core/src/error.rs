//! Error types for soundscape-core.

use thiserror::Error;

/// Error type for soundscape-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown pack: {0}")]
    UnknownPack(String),

    #[error("Invalid composition: {0}")]
    InvalidComposition(String),

    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Data source error: {0}")]
    DataSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
