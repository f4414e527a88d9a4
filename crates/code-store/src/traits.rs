use async_trait::async_trait;

use crate::error::StoreResult;
use crate::request::{
    DeleteRequest, GetRequest, GetResponse, IndexRequest, SearchRequest, SearchResponse,
    UpdateRequest, WriteResponse,
};

/// Document-search backend addressed by index, type, and document id.
///
/// All implementations must satisfy these invariants:
/// - `index` fully replaces the document at `(index, id)`, creating the index
///   if needed.
/// - `update` deep-merges `doc` into the existing source and fails with
///   `NotFound` if the document does not exist.
/// - `get`, `update`, and `delete` of a missing document fail with
///   `NotFound` (or `IndexNotFound` when the index itself is missing).
/// - Every successful write increments the document version. A write with
///   `if_version` set fails with `VersionConflict` unless it matches.
/// - Failures are propagated, never retried or silently ignored.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a full document.
    async fn index(&self, request: IndexRequest) -> StoreResult<WriteResponse>;

    /// Fetch a document by id.
    async fn get(&self, request: GetRequest) -> StoreResult<GetResponse>;

    /// Merge a partial document into an existing one.
    async fn update(&self, request: UpdateRequest) -> StoreResult<WriteResponse>;

    /// Remove a document by id.
    async fn delete(&self, request: DeleteRequest) -> StoreResult<WriteResponse>;

    /// Search across indices matching the request's index pattern.
    async fn search(&self, request: SearchRequest) -> StoreResult<SearchResponse>;
}
