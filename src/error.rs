use thiserror::Error;

/// A vector handed to a network doesn't match its topology
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DimensionError {
    #[error("weight count mismatch: expected {expected}, got {actual}")]
    Weights { expected: usize, actual: usize },
    #[error("input count mismatch: expected {expected}, got {actual}")]
    Inputs { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dimension(#[from] DimensionError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("snapshot contains no genotypes")]
    EmptySnapshot,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
