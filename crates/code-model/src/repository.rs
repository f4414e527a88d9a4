//! Repository metadata and per-repository configuration.

use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::uri::{GitUrl, RepositoryUri};

/// Metadata for one tracked source repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Host-qualified repository URI (`github.com/elastic/code`).
    pub uri: RepositoryUri,
    /// Clone URL.
    pub url: String,
    /// Owner or group path.
    pub org: String,
    /// Repository name.
    pub name: String,
    /// Default branch, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    /// Last indexed revision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl Repository {
    pub fn new(
        uri: RepositoryUri,
        url: impl Into<String>,
        org: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            uri,
            url: url.into(),
            org: org.into(),
            name: name.into(),
            default_branch: None,
            revision: None,
        }
    }

    /// Build repository metadata from a clone URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use code_model::Repository;
    ///
    /// let repo = Repository::from_url("https://github.com/elastic/code.git").unwrap();
    /// assert_eq!(repo.uri.as_str(), "github.com/elastic/code");
    /// assert_eq!(repo.org, "elastic");
    /// assert_eq!(repo.name, "code");
    /// ```
    pub fn from_url(url: &str) -> ModelResult<Self> {
        let parsed = GitUrl::parse(url)?;
        let uri = parsed.to_uri()?;
        Ok(Self::new(uri, url.trim(), parsed.org, parsed.name))
    }
}

/// Partial update for [`Repository`]. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl RepositoryPatch {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Languages with a switchable language server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LspLanguage {
    Go,
    Java,
    Typescript,
}

/// Per-repository language server configuration.
///
/// A `None` switch means "use the server default", which is enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub uri: RepositoryUri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_go: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_java: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_typescript: Option<bool>,
}

impl RepositoryConfig {
    /// A config with every language left at its default.
    pub fn new(uri: RepositoryUri) -> Self {
        Self {
            uri,
            disable_go: None,
            disable_java: None,
            disable_typescript: None,
        }
    }

    /// Whether the language server for `language` is switched off.
    pub fn is_disabled(&self, language: LspLanguage) -> bool {
        let switch = match language {
            LspLanguage::Go => self.disable_go,
            LspLanguage::Java => self.disable_java,
            LspLanguage::Typescript => self.disable_typescript,
        };
        switch.unwrap_or(false)
    }
}

/// Partial update for [`RepositoryConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_go: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_java: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_typescript: Option<bool>,
}

impl RepositoryConfigPatch {
    /// Patch that sets the switch for a single language.
    pub fn disable(language: LspLanguage, disabled: bool) -> Self {
        let mut patch = Self::default();
        match language {
            LspLanguage::Go => patch.disable_go = Some(disabled),
            LspLanguage::Java => patch.disable_java = Some(disabled),
            LspLanguage::Typescript => patch.disable_typescript = Some(disabled),
        }
        patch
    }
}
