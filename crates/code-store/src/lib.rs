//! Document store capability for the code repository object store.
//!
//! The persistence layer talks to a document-search backend through five
//! primitives: `index`, `get`, `update`, `delete`, and `search`. This crate
//! defines them as the [`DocumentStore`] trait over JSON bodies, together with
//! a reference backend.
//!
//! # Storage Backends
//!
//! - [`InMemoryDocumentStore`] -- `BTreeMap`-based store for tests, embedding,
//!   and JSON snapshot files
//!
//! # Store Rules
//!
//! 1. Documents are addressed by index name, document type, and id.
//! 2. `index` replaces the whole document; `update` deep-merges a partial one.
//! 3. Every write bumps the document version; writes may carry an expected
//!    version and fail with [`StoreError::VersionConflict`] on mismatch.
//! 4. Missing documents surface as [`StoreError::NotFound`], never as empty
//!    bodies.
//! 5. The store never interprets document contents beyond field existence.

pub mod error;
pub mod memory;
pub mod naming;
pub mod request;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDocumentStore;
pub use naming::{matches_index_pattern, validate_index_name, MAX_INDEX_NAME_BYTES};
pub use request::{
    DeleteRequest, GetRequest, GetResponse, IndexRequest, Query, SearchHit, SearchRequest,
    SearchResponse, UpdateRequest, WriteOutcome, WriteResponse,
};
pub use traits::DocumentStore;
