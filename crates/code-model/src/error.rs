use thiserror::Error;

/// Errors produced while constructing or validating domain records.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    /// The repository URI is malformed.
    #[error("invalid repository uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    /// The clone URL cannot be mapped to a repository URI.
    #[error("invalid repository url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Progress outside `0..=100` that is not a reserved sentinel.
    #[error("invalid progress value: {0}")]
    InvalidProgress(f64),
}

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
