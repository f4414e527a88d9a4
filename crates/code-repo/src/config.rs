use std::path::Path;

use code_model::MAX_INDEX_SUFFIX_BYTES;
use code_store::{validate_index_name, MAX_INDEX_NAME_BYTES};
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};
use crate::layout::{RepositoryIndexLayout, DEFAULT_DOC_TYPE, DEFAULT_INDEX_PREFIX};

/// Settings for [`RepositoryObjectClient`](crate::RepositoryObjectClient).
///
/// Loaded from TOML; every key is optional:
///
/// ```toml
/// index_prefix = ".code-repository"
/// doc_type = "_doc"
/// search_page_size = 1000
/// max_repositories = 50000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Prefix of every repository index.
    pub index_prefix: String,
    /// Document type used for all repository documents.
    pub doc_type: String,
    /// Hits requested per search page when listing repositories.
    pub search_page_size: usize,
    /// Upper bound on repositories returned by a listing; `None` is unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_repositories: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            index_prefix: DEFAULT_INDEX_PREFIX.to_string(),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            search_page_size: 1000,
            max_repositories: None,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> RepoResult<Self> {
        let config: Self = toml::from_str(input).map_err(|e| RepoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: &Path) -> RepoResult<Self> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> RepoResult<()> {
        validate_index_name(&self.index_prefix)
            .map_err(|e| RepoError::Config(format!("index_prefix: {e}")))?;
        // `<prefix>-<suffix>` must stay a valid index name for every URI.
        let max_prefix = MAX_INDEX_NAME_BYTES - 1 - MAX_INDEX_SUFFIX_BYTES;
        if self.index_prefix.len() > max_prefix {
            return Err(RepoError::Config(format!(
                "index_prefix must be at most {max_prefix} bytes"
            )));
        }
        if self.doc_type.is_empty() {
            return Err(RepoError::Config("doc_type must not be empty".into()));
        }
        if self.search_page_size == 0 {
            return Err(RepoError::Config(
                "search_page_size must be greater than zero".into(),
            ));
        }
        if self.max_repositories == Some(0) {
            return Err(RepoError::Config(
                "max_repositories must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn layout(&self) -> RepositoryIndexLayout {
        RepositoryIndexLayout::new(&self.index_prefix, &self.doc_type)
    }
}
