/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document does not exist in the index.
    #[error("document not found: {index}/{id}")]
    NotFound { index: String, id: String },

    /// No index matches the given name.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// The document changed since the version the caller expected.
    #[error("version conflict for {index}/{id}: expected {expected}, current {current}")]
    VersionConflict {
        index: String,
        id: String,
        expected: u64,
        current: u64,
    },

    /// The index name violates backend naming rules.
    #[error("invalid index name {name:?}: {reason}")]
    InvalidIndexName { name: String, reason: String },

    /// The request body is not usable for the operation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Backend failure (network, cluster, lock poisoning).
    #[error("store failure: {0}")]
    Backend(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from snapshot persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for a missing document or a missing index.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::IndexNotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
