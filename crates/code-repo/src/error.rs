//! Error types for repository object operations.

use code_model::ModelError;
use code_store::StoreError;
use thiserror::Error;

use crate::field::ReservedField;

/// Errors that can occur while reading or writing repository objects.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Failure reported by the document store, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The document exists but does not carry the expected field.
    #[error("field {field} missing from document in {index}")]
    FieldMissing { index: String, field: ReservedField },

    /// The stored field does not decode into the expected record.
    #[error("failed to decode {field}: {source}")]
    Decode {
        field: ReservedField,
        source: serde_json::Error,
    },

    /// The record could not be encoded as JSON.
    #[error("failed to encode {field}: {source}")]
    Encode {
        field: ReservedField,
        source: serde_json::Error,
    },

    /// Client configuration is unreadable or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A record failed validation before reaching the store.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RepoError {
    /// Returns `true` if the document, its index, or its field is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            Self::FieldMissing { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if a conditional write lost a race.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::VersionConflict { .. }))
    }
}

/// Convenience type alias for repository object operations.
pub type RepoResult<T> = std::result::Result<T, RepoError>;
