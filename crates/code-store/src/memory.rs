use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::naming::{is_concrete, matches_index_pattern, validate_index_name};
use crate::request::{
    DeleteRequest, GetRequest, GetResponse, IndexRequest, SearchHit, SearchRequest,
    SearchResponse, UpdateRequest, WriteOutcome, WriteResponse,
};
use crate::traits::DocumentStore;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(rename = "type")]
    doc_type: String,
    version: u64,
    source: Value,
}

type Documents = BTreeMap<String, StoredDocument>;
type Indices = BTreeMap<String, Documents>;

/// In-memory, `BTreeMap`-based document store.
///
/// Intended for tests, embedding, and small single-process deployments that
/// persist through [`save_snapshot`](Self::save_snapshot). Indices and
/// documents are kept in key order, so search hits come back ordered by index
/// name and then document id.
pub struct InMemoryDocumentStore {
    indices: RwLock<Indices>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            indices: RwLock::new(BTreeMap::new()),
        }
    }

    /// Total number of documents across all indices.
    pub fn len(&self) -> usize {
        self.read_indices()
            .map(|indices| indices.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of index names.
    pub fn index_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.read_indices()?.keys().cloned().collect())
    }

    /// Write every index to `path` as JSON.
    ///
    /// The snapshot is written to a temporary file in the same directory and
    /// renamed into place, so a crash never leaves a truncated snapshot.
    pub fn save_snapshot(&self, path: &Path) -> StoreResult<()> {
        let bytes = {
            let indices = self.read_indices()?;
            serde_json::to_vec_pretty(&*indices)?
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        info!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    /// Load a store from a snapshot written by [`save_snapshot`](Self::save_snapshot).
    pub fn load_snapshot(path: &Path) -> StoreResult<Self> {
        let bytes = std::fs::read(path)?;
        let indices: Indices = serde_json::from_slice(&bytes)?;
        for name in indices.keys() {
            validate_index_name(name)?;
        }
        let count: usize = indices.values().map(BTreeMap::len).sum();
        info!(
            path = %path.display(),
            indices = indices.len(),
            documents = count,
            "snapshot loaded"
        );
        Ok(Self {
            indices: RwLock::new(indices),
        })
    }

    fn read_indices(&self) -> StoreResult<RwLockReadGuard<'_, Indices>> {
        self.indices
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write_indices(&self) -> StoreResult<RwLockWriteGuard<'_, Indices>> {
        self.indices
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .finish()
    }
}

fn not_found(index: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        index: index.to_string(),
        id: id.to_string(),
    }
}

/// Look up a document of the given type; a type mismatch reads as missing.
fn lookup_mut<'a>(
    indices: &'a mut Indices,
    index: &str,
    doc_type: &str,
    id: &str,
) -> StoreResult<&'a mut StoredDocument> {
    let docs = indices
        .get_mut(index)
        .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))?;
    docs.get_mut(id)
        .filter(|doc| doc.doc_type == doc_type)
        .ok_or_else(|| not_found(index, id))
}

fn check_version(
    index: &str,
    id: &str,
    expected: Option<u64>,
    current: Option<u64>,
) -> StoreResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let current = current.unwrap_or(0);
    if expected != current {
        return Err(StoreError::VersionConflict {
            index: index.to_string(),
            id: id.to_string(),
            expected,
            current,
        });
    }
    Ok(())
}

/// Recursively merge `patch` into `target`. Objects merge key by key; any
/// other value replaces what was there.
fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn index(&self, request: IndexRequest) -> StoreResult<WriteResponse> {
        validate_index_name(&request.index)?;
        if !request.body.is_object() {
            return Err(StoreError::InvalidRequest(
                "document body must be a JSON object".into(),
            ));
        }

        let mut indices = self.write_indices()?;
        let docs = indices.entry(request.index.clone()).or_default();
        let current = docs.get(&request.id).map(|doc| doc.version);
        check_version(&request.index, &request.id, request.if_version, current)?;

        let version = current.map_or(1, |v| v + 1);
        docs.insert(
            request.id.clone(),
            StoredDocument {
                doc_type: request.doc_type,
                version,
                source: request.body,
            },
        );
        let result = if current.is_some() {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        };
        debug!(index = %request.index, id = %request.id, version, ?result, "document indexed");
        Ok(WriteResponse {
            index: request.index,
            id: request.id,
            version,
            result,
        })
    }

    async fn get(&self, request: GetRequest) -> StoreResult<GetResponse> {
        let indices = self.read_indices()?;
        let docs = indices
            .get(&request.index)
            .ok_or_else(|| StoreError::IndexNotFound(request.index.clone()))?;
        let doc = docs
            .get(&request.id)
            .filter(|doc| doc.doc_type == request.doc_type)
            .ok_or_else(|| not_found(&request.index, &request.id))?;
        Ok(GetResponse {
            index: request.index,
            id: request.id,
            version: doc.version,
            source: doc.source.clone(),
        })
    }

    async fn update(&self, request: UpdateRequest) -> StoreResult<WriteResponse> {
        if !request.doc.is_object() {
            return Err(StoreError::InvalidRequest(
                "partial document must be a JSON object".into(),
            ));
        }

        let mut indices = self.write_indices()?;
        let doc = lookup_mut(&mut indices, &request.index, &request.doc_type, &request.id)?;
        check_version(&request.index, &request.id, request.if_version, Some(doc.version))?;

        let mut merged = doc.source.clone();
        deep_merge(&mut merged, &request.doc);
        let result = if merged == doc.source {
            WriteOutcome::Noop
        } else {
            doc.source = merged;
            doc.version += 1;
            WriteOutcome::Updated
        };
        debug!(
            index = %request.index,
            id = %request.id,
            version = doc.version,
            ?result,
            "document updated"
        );
        Ok(WriteResponse {
            version: doc.version,
            index: request.index,
            id: request.id,
            result,
        })
    }

    async fn delete(&self, request: DeleteRequest) -> StoreResult<WriteResponse> {
        let mut indices = self.write_indices()?;
        let version = lookup_mut(&mut indices, &request.index, &request.doc_type, &request.id)?
            .version
            + 1;
        if let Some(docs) = indices.get_mut(&request.index) {
            docs.remove(&request.id);
        }
        debug!(index = %request.index, id = %request.id, "document deleted");
        Ok(WriteResponse {
            index: request.index,
            id: request.id,
            version,
            result: WriteOutcome::Deleted,
        })
    }

    async fn search(&self, request: SearchRequest) -> StoreResult<SearchResponse> {
        let indices = self.read_indices()?;
        if is_concrete(&request.index) && !indices.contains_key(&request.index) {
            return Err(StoreError::IndexNotFound(request.index));
        }

        let mut total = 0;
        let mut hits = Vec::new();
        let matching = indices
            .iter()
            .filter(|(name, _)| matches_index_pattern(&request.index, name))
            .flat_map(|(name, docs)| docs.iter().map(move |(id, doc)| (name, id, doc)))
            .filter(|(_, _, doc)| {
                request
                    .doc_type
                    .as_ref()
                    .map_or(true, |t| *t == doc.doc_type)
            })
            .filter(|(_, _, doc)| request.query.matches(&doc.source));

        for (name, id, doc) in matching {
            if total >= request.from && hits.len() < request.size {
                hits.push(SearchHit {
                    index: name.clone(),
                    doc_type: doc.doc_type.clone(),
                    id: id.clone(),
                    version: doc.version,
                    source: doc.source.clone(),
                });
            }
            total += 1;
        }

        debug!(pattern = %request.index, total, returned = hits.len(), "search executed");
        Ok(SearchResponse { total, hits })
    }
}
