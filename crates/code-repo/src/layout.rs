//! Index naming for repository documents.

use code_model::RepositoryUri;

/// Default prefix shared by every repository index.
pub const DEFAULT_INDEX_PREFIX: &str = ".code-repository";

/// Default document type for repository documents.
pub const DEFAULT_DOC_TYPE: &str = "_doc";

/// Where repository documents live: one index per repository, all sharing a
/// common prefix so a single wildcard covers them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryIndexLayout {
    prefix: String,
    doc_type: String,
}

impl RepositoryIndexLayout {
    pub fn new(prefix: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            doc_type: doc_type.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Index holding every document of `uri`: `<prefix>-<normalized uri>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use code_model::RepositoryUri;
    /// use code_repo::RepositoryIndexLayout;
    ///
    /// let layout = RepositoryIndexLayout::default();
    /// let uri = RepositoryUri::new("github.com/elastic/code").unwrap();
    /// assert!(layout
    ///     .index_name(&uri)
    ///     .starts_with(".code-repository-github.com-elastic-code-"));
    /// ```
    pub fn index_name(&self, uri: &RepositoryUri) -> String {
        format!("{}-{}", self.prefix, uri.index_suffix())
    }

    /// Pattern matching every repository index.
    pub fn wildcard(&self) -> String {
        format!("{}*", self.prefix)
    }
}

impl Default for RepositoryIndexLayout {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_PREFIX, DEFAULT_DOC_TYPE)
    }
}
