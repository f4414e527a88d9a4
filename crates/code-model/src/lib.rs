//! Domain records for the code repository object store.
//!
//! Every tracked source repository is described by a small set of plain value
//! records. None of them carries identity beyond the repository URI; the
//! persistence layer keys them by URI and object kind.
//!
//! # Key Types
//!
//! - [`RepositoryUri`]: validated `host/org/name` repository identifier
//! - [`Repository`]: repository metadata (URL, org, name)
//! - [`RepositoryConfig`]: per-repository language server switches
//! - [`WorkerProgress`]: progress snapshot reported by a background worker
//! - [`CloneWorkerProgress`] / [`IndexWorkerProgress`]: worker-specific
//!   progress snapshots
//!
//! Partial updates are expressed as patch records ([`RepositoryPatch`],
//! [`ProgressPatch`], ...) whose absent fields are omitted when serialized.

pub mod error;
pub mod progress;
pub mod repository;
pub mod uri;

pub use error::{ModelError, ModelResult};
pub use progress::{
    CloneProgress, CloneProgressPatch, CloneWorkerProgress, IndexProgress, IndexProgressPatch,
    IndexWorkerProgress, ProgressPatch, ProgressState, WorkerProgress,
};
pub use repository::{
    LspLanguage, Repository, RepositoryConfig, RepositoryConfigPatch, RepositoryPatch,
};
pub use uri::{GitUrl, RepositoryUri, MAX_INDEX_SUFFIX_BYTES};
