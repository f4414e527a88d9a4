//! Progress snapshots reported by background workers.
//!
//! Clone, index, language-server-index, and delete workers each publish a
//! progress record for the repository they work on. A record is overwritten
//! or merged on every report; there is no history.
//!
//! Progress is a percentage in `0..=100`. Two negative values are reserved
//! as sentinels: [`ERROR_PROGRESS`] and [`TIMEOUT_PROGRESS`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::uri::RepositoryUri;

/// Progress of a freshly scheduled worker.
pub const INIT_PROGRESS: f64 = 0.0;
/// Progress of a worker that finished successfully.
pub const COMPLETED_PROGRESS: f64 = 100.0;
/// Progress reported by a worker that failed.
pub const ERROR_PROGRESS: f64 = -100.0;
/// Progress reported by a worker that timed out.
pub const TIMEOUT_PROGRESS: f64 = -200.0;

/// Coarse state derived from a progress value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressState {
    Initialized,
    InProgress,
    Completed,
    Error,
    Timeout,
}

impl ProgressState {
    /// Classify a progress value, rejecting anything that is neither a
    /// percentage nor a reserved sentinel.
    pub fn from_value(progress: f64) -> ModelResult<Self> {
        if progress == ERROR_PROGRESS {
            Ok(Self::Error)
        } else if progress == TIMEOUT_PROGRESS {
            Ok(Self::Timeout)
        } else if progress == INIT_PROGRESS {
            Ok(Self::Initialized)
        } else if progress == COMPLETED_PROGRESS {
            Ok(Self::Completed)
        } else if progress > INIT_PROGRESS && progress < COMPLETED_PROGRESS {
            Ok(Self::InProgress)
        } else {
            Err(ModelError::InvalidProgress(progress))
        }
    }

    /// Returns `true` once the worker will report no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Timeout)
    }
}

/// Generic worker progress snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProgress {
    pub uri: RepositoryUri,
    pub progress: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl WorkerProgress {
    /// Create a snapshot, validating the progress value.
    pub fn new(uri: RepositoryUri, progress: f64, timestamp: DateTime<Utc>) -> ModelResult<Self> {
        ProgressState::from_value(progress)?;
        Ok(Self {
            uri,
            progress,
            timestamp,
            revision: None,
            error_message: None,
        })
    }

    /// A failed snapshot carrying an error message.
    pub fn error(uri: RepositoryUri, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            uri,
            progress: ERROR_PROGRESS,
            timestamp,
            revision: None,
            error_message: Some(message.into()),
        }
    }

    pub fn state(&self) -> ModelResult<ProgressState> {
        ProgressState::from_value(self.progress)
    }
}

/// Object counters reported by a git clone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProgress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_cloned: Option<bool>,
    pub received_objects: u64,
    pub indexed_objects: u64,
    pub total_objects: u64,
    pub local_objects: u64,
    pub total_deltas: u64,
    pub indexed_deltas: u64,
    pub received_bytes: u64,
}

impl CloneProgress {
    /// Percentage of objects received, or `0.0` before the total is known.
    pub fn percentage(&self) -> f64 {
        if self.total_objects == 0 {
            return 0.0;
        }
        (self.received_objects as f64 / self.total_objects as f64) * 100.0
    }
}

/// Progress of a clone or delete worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneWorkerProgress {
    #[serde(flatten)]
    pub base: WorkerProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_progress: Option<CloneProgress>,
}

impl CloneWorkerProgress {
    pub fn new(base: WorkerProgress) -> Self {
        Self {
            base,
            clone_progress: None,
        }
    }

    pub fn with_clone_progress(mut self, clone_progress: CloneProgress) -> Self {
        self.clone_progress = Some(clone_progress);
        self
    }
}

/// Document counters reported by the text indexer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexProgress {
    #[serde(rename = "type")]
    pub kind: String,
    pub total: u64,
    pub success: u64,
    pub fail: u64,
    pub percentage: f64,
}

/// Progress of a text-index worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexWorkerProgress {
    #[serde(flatten)]
    pub base: WorkerProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_progress: Option<IndexProgress>,
}

impl IndexWorkerProgress {
    pub fn new(base: WorkerProgress) -> Self {
        Self {
            base,
            index_progress: None,
        }
    }
}

/// Partial update for any progress record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProgressPatch {
    /// Patch carrying only a progress value.
    pub fn progress(progress: f64) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Reject patches carrying an invalid progress value.
    pub fn validate(&self) -> ModelResult<()> {
        if let Some(progress) = self.progress {
            ProgressState::from_value(progress)?;
        }
        Ok(())
    }
}

/// Partial update for [`CloneWorkerProgress`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProgressPatch {
    #[serde(flatten)]
    pub base: ProgressPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_progress: Option<CloneProgress>,
}

impl From<ProgressPatch> for CloneProgressPatch {
    fn from(base: ProgressPatch) -> Self {
        Self {
            base,
            clone_progress: None,
        }
    }
}

/// Partial update for [`IndexWorkerProgress`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexProgressPatch {
    #[serde(flatten)]
    pub base: ProgressPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_progress: Option<IndexProgress>,
}

impl From<ProgressPatch> for IndexProgressPatch {
    fn from(base: ProgressPatch) -> Self {
        Self {
            base,
            index_progress: None,
        }
    }
}
