//! Reserved fields: one fixed key per repository object kind.
//!
//! A reserved field is both the id of the document holding an object and the
//! top-level JSON key wrapping the object inside that document, e.g.
//! `{"repository_git_status": {"uri": ..., "progress": 100, ...}}`.

use std::fmt;

/// Object kinds stored per repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReservedField {
    /// Repository metadata.
    Repository,
    /// Git clone worker status.
    GitStatus,
    /// Language server index worker status.
    LspIndexStatus,
    /// Delete worker status.
    DeleteStatus,
    /// Text index worker status.
    IndexStatus,
    /// Per-repository configuration.
    Config,
}

impl ReservedField {
    pub const ALL: [Self; 6] = [
        Self::Repository,
        Self::GitStatus,
        Self::LspIndexStatus,
        Self::DeleteStatus,
        Self::IndexStatus,
        Self::Config,
    ];

    /// Worker status kinds.
    pub const STATUSES: [Self; 4] = [
        Self::GitStatus,
        Self::LspIndexStatus,
        Self::DeleteStatus,
        Self::IndexStatus,
    ];

    /// The document id and wrapper key for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::GitStatus => "repository_git_status",
            Self::LspIndexStatus => "repository_lsp_index_status",
            Self::DeleteStatus => "repository_delete_status",
            Self::IndexStatus => "repository_index_status",
            Self::Config => "repository_config",
        }
    }

    pub fn is_status(self) -> bool {
        Self::STATUSES.contains(&self)
    }
}

impl fmt::Display for ReservedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
