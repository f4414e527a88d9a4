//! Repository object persistence for the code search service.
//!
//! [`RepositoryObjectClient`] maps typed repository records onto documents in
//! a [`DocumentStore`](code_store::DocumentStore). Each repository owns one
//! index, named deterministically from its URI, and each object kind lives in
//! exactly one document inside it, addressed by a [`ReservedField`]:
//!
//! | Kind | Document id / wrapper key |
//! |---|---|
//! | repository metadata | `repository` |
//! | git clone status | `repository_git_status` |
//! | LSP index status | `repository_lsp_index_status` |
//! | delete status | `repository_delete_status` |
//! | text index status | `repository_index_status` |
//! | repository config | `repository_config` |
//!
//! `set_*` replaces the document, `update_*` merges a partial record into it,
//! `get_*` decodes it back. Store failures are returned unchanged; the client
//! never retries and never caches.

pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod layout;

pub use client::{RepositoryObjectClient, Versioned};
pub use config::ClientConfig;
pub use error::{RepoError, RepoResult};
pub use field::ReservedField;
pub use layout::RepositoryIndexLayout;
