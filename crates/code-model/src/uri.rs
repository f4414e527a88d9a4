//! Repository URIs and clone URL parsing.
//!
//! A repository URI is the host-qualified path of a repository with no
//! scheme and no `.git` suffix, e.g. `github.com/elastic/code`. Valid URIs:
//! - Must be non-empty
//! - Must not contain whitespace or `..`
//! - Must not start or end with `/`
//! - Must not contain empty path segments (`//`)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Number of hash bytes appended to an index suffix (8 hex characters).
const SUFFIX_HASH_BYTES: usize = 4;

/// Upper bound on the length of [`RepositoryUri::index_suffix`].
pub const MAX_INDEX_SUFFIX_BYTES: usize = 200;

/// URL schemes accepted by [`GitUrl::parse`].
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "ssh", "git"];

/// A validated repository URI such as `github.com/elastic/code`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryUri(String);

impl RepositoryUri {
    /// Validate and wrap a repository URI.
    ///
    /// # Examples
    ///
    /// ```
    /// use code_model::RepositoryUri;
    ///
    /// assert!(RepositoryUri::new("github.com/elastic/code").is_ok());
    /// assert!(RepositoryUri::new("").is_err());
    /// assert!(RepositoryUri::new("github.com//code").is_err());
    /// ```
    pub fn new(uri: impl Into<String>) -> ModelResult<Self> {
        let uri = uri.into();
        validate_uri(&uri)?;
        Ok(Self(uri))
    }

    /// The URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic, index-name-safe rendering of this URI.
    ///
    /// The URI is lowercased and every character outside `[a-z0-9._-]` is
    /// replaced with `-`. Eight hex digits of the BLAKE3 hash of the original
    /// URI are appended so that URIs differing only in case or punctuation
    /// never share a suffix.
    ///
    /// The normalized part is truncated so the whole suffix never exceeds
    /// [`MAX_INDEX_SUFFIX_BYTES`]; the hash still tells long URIs apart.
    pub fn index_suffix(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        let short = hex::encode(&hash.as_bytes()[..SUFFIX_HASH_BYTES]);
        let max_slug = MAX_INDEX_SUFFIX_BYTES - 1 - short.len();

        let mut out = String::with_capacity(MAX_INDEX_SUFFIX_BYTES);
        // Normalized characters are ASCII, so one char is one byte.
        for ch in self.0.chars().take(max_slug) {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                out.push(ch);
            } else {
                out.push('-');
            }
        }
        out.push('-');
        out.push_str(&short);
        out
    }
}

impl fmt::Debug for RepositoryUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepositoryUri({})", self.0)
    }
}

impl fmt::Display for RepositoryUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepositoryUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryUri {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<RepositoryUri> for String {
    fn from(uri: RepositoryUri) -> Self {
        uri.0
    }
}

impl std::str::FromStr for RepositoryUri {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        Self::new(s)
    }
}

fn validate_uri(uri: &str) -> ModelResult<()> {
    let invalid = |reason: &str| ModelError::InvalidUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    if uri.is_empty() {
        return Err(invalid("uri must not be empty"));
    }
    if uri.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    if uri.contains("..") {
        return Err(invalid("must not contain '..'"));
    }
    if uri.starts_with('/') || uri.ends_with('/') {
        return Err(invalid("must not start or end with '/'"));
    }
    if uri.split('/').any(str::is_empty) {
        return Err(invalid("path segments must not be empty"));
    }
    Ok(())
}

/// The parts of a git clone URL that identify a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitUrl {
    /// Lowercased host name, without user info or port.
    pub host: String,
    /// Owner path; may itself contain `/` for nested groups.
    pub org: String,
    /// Repository name without the `.git` suffix.
    pub name: String,
}

impl GitUrl {
    /// Parse a clone URL.
    ///
    /// Accepts `scheme://[user@]host[:port]/org/name[.git]` for http, https,
    /// ssh, and git schemes, and the scp-like `user@host:org/name[.git]`.
    pub fn parse(url: &str) -> ModelResult<Self> {
        let invalid = |reason: &str| ModelError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(invalid("url must not be empty"));
        }

        let (authority, path) = if let Some((scheme, rest)) = trimmed.split_once("://") {
            if !SUPPORTED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
                return Err(invalid(&format!("unsupported scheme: {scheme}")));
            }
            let (authority, path) = rest
                .split_once('/')
                .ok_or_else(|| invalid("missing repository path"))?;
            let host_port = authority.rsplit('@').next().unwrap_or(authority);
            let host = host_port.split(':').next().unwrap_or(host_port);
            (host, path)
        } else if let Some((before, path)) = trimmed.split_once(':') {
            (before.rsplit('@').next().unwrap_or(before), path)
        } else {
            return Err(invalid("not a recognized clone url"));
        };

        if authority.is_empty() {
            return Err(invalid("missing host"));
        }

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((name, org)) = segments.split_last() else {
            return Err(invalid("missing repository path"));
        };
        if org.is_empty() {
            return Err(invalid("path must contain an owner and a name"));
        }

        Ok(Self {
            host: authority.to_ascii_lowercase(),
            org: org.join("/"),
            name: (*name).to_string(),
        })
    }

    /// The repository URI this URL identifies (`host/org/name`).
    pub fn to_uri(&self) -> ModelResult<RepositoryUri> {
        RepositoryUri::new(format!("{}/{}/{}", self.host, self.org, self.name))
    }
}
