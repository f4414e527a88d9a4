//! The [`RepositoryObjectClient`] persistence mapper.
//!
//! Every operation is a single store call. The document for object kind `K`
//! of repository `uri` lives at index `IndexName(uri)`, id `K.as_str()`, and
//! wraps the record under the same key:
//!
//! - set: `index { id: K, body: { K: record } }`
//! - get: `get { id: K }`, returning `_source[K]`
//! - update: `update { id: K, body: { doc: { K: patch } } }`
//! - delete: `delete { id: K }` (repository metadata only)

use std::sync::Arc;

use code_model::{
    CloneProgressPatch, CloneWorkerProgress, IndexProgressPatch, IndexWorkerProgress,
    ProgressPatch, Repository, RepositoryConfig, RepositoryConfigPatch, RepositoryPatch,
    RepositoryUri, WorkerProgress,
};
use code_store::{
    DeleteRequest, DocumentStore, GetRequest, IndexRequest, Query, SearchRequest, UpdateRequest,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{RepoError, RepoResult};
use crate::field::ReservedField;
use crate::layout::RepositoryIndexLayout;

/// A decoded object together with the store version it was read at.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Typed get/set/update/delete of repository objects over a [`DocumentStore`].
///
/// The client is stateless apart from its configuration: it holds no cache,
/// takes no locks, and never retries. Concurrent writers to the same object
/// race at the store; use [`get_versioned`](Self::get_versioned) and
/// [`update_if_version`](Self::update_if_version) to detect lost updates.
pub struct RepositoryObjectClient {
    store: Arc<dyn DocumentStore>,
    config: ClientConfig,
    layout: RepositoryIndexLayout,
}

impl RepositoryObjectClient {
    /// Create a client with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let config = ClientConfig::default();
        let layout = config.layout();
        Self {
            store,
            config,
            layout,
        }
    }

    /// Create a client with a validated configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: ClientConfig) -> RepoResult<Self> {
        config.validate()?;
        let layout = config.layout();
        Ok(Self {
            store,
            config,
            layout,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn layout(&self) -> &RepositoryIndexLayout {
        &self.layout
    }

    // ---- Repository metadata ----

    pub async fn get_repository(&self, uri: &RepositoryUri) -> RepoResult<Repository> {
        self.get_object(uri, ReservedField::Repository).await
    }

    pub async fn set_repository(&self, uri: &RepositoryUri, repo: &Repository) -> RepoResult<()> {
        self.set_object(uri, ReservedField::Repository, repo).await
    }

    pub async fn update_repository(
        &self,
        uri: &RepositoryUri,
        patch: &RepositoryPatch,
    ) -> RepoResult<()> {
        self.update_object(uri, ReservedField::Repository, patch).await
    }

    /// Remove the repository metadata document. Status documents are left in
    /// place.
    pub async fn delete_repository(&self, uri: &RepositoryUri) -> RepoResult<()> {
        let request = DeleteRequest {
            index: self.layout.index_name(uri),
            doc_type: self.layout.doc_type().to_string(),
            id: ReservedField::Repository.as_str().to_string(),
        };
        debug!(index = %request.index, "deleting repository document");
        self.store.delete(request).await?;
        Ok(())
    }

    /// List every repository with a stored metadata document.
    ///
    /// Searches all repository indices for documents carrying the
    /// [`ReservedField::Repository`] field, page by page, in store hit order.
    /// Stops early once `max_repositories` records have been collected.
    pub async fn get_all_repositories(&self) -> RepoResult<Vec<Repository>> {
        let field = ReservedField::Repository;
        let page_size = self.config.search_page_size;
        let mut repos = Vec::new();
        let mut from = 0;

        loop {
            let limit = match self.config.max_repositories {
                Some(max) => max.saturating_sub(repos.len()).min(page_size),
                None => page_size,
            };
            if limit == 0 {
                break;
            }

            let request = SearchRequest::new(self.layout.wildcard(), limit)
                .with_type(self.layout.doc_type())
                .with_query(Query::exists(field.as_str()))
                .with_from(from);
            debug!(pattern = %request.index, from, size = limit, "searching repositories");
            let response = self.store.search(request).await?;

            let returned = response.hits.len();
            for hit in response.hits {
                repos.push(decode_field(hit.source, field, &hit.index)?);
            }
            from += returned;
            if returned < limit || from >= response.total {
                break;
            }
        }

        Ok(repos)
    }

    // ---- Git clone status ----

    pub async fn get_repository_git_status(
        &self,
        uri: &RepositoryUri,
    ) -> RepoResult<CloneWorkerProgress> {
        self.get_object(uri, ReservedField::GitStatus).await
    }

    pub async fn set_repository_git_status(
        &self,
        uri: &RepositoryUri,
        status: &CloneWorkerProgress,
    ) -> RepoResult<()> {
        status.base.state()?;
        self.set_object(uri, ReservedField::GitStatus, status).await
    }

    pub async fn update_repository_git_status(
        &self,
        uri: &RepositoryUri,
        patch: &CloneProgressPatch,
    ) -> RepoResult<()> {
        patch.base.validate()?;
        self.update_object(uri, ReservedField::GitStatus, patch).await
    }

    // ---- LSP index status ----

    pub async fn get_repository_lsp_index_status(
        &self,
        uri: &RepositoryUri,
    ) -> RepoResult<WorkerProgress> {
        self.get_object(uri, ReservedField::LspIndexStatus).await
    }

    pub async fn set_repository_lsp_index_status(
        &self,
        uri: &RepositoryUri,
        status: &WorkerProgress,
    ) -> RepoResult<()> {
        status.state()?;
        self.set_object(uri, ReservedField::LspIndexStatus, status)
            .await
    }

    pub async fn update_repository_lsp_index_status(
        &self,
        uri: &RepositoryUri,
        patch: &ProgressPatch,
    ) -> RepoResult<()> {
        patch.validate()?;
        self.update_object(uri, ReservedField::LspIndexStatus, patch)
            .await
    }

    // ---- Delete status ----

    pub async fn get_repository_delete_status(
        &self,
        uri: &RepositoryUri,
    ) -> RepoResult<CloneWorkerProgress> {
        self.get_object(uri, ReservedField::DeleteStatus).await
    }

    pub async fn set_repository_delete_status(
        &self,
        uri: &RepositoryUri,
        status: &CloneWorkerProgress,
    ) -> RepoResult<()> {
        status.base.state()?;
        self.set_object(uri, ReservedField::DeleteStatus, status).await
    }

    pub async fn update_repository_delete_status(
        &self,
        uri: &RepositoryUri,
        patch: &CloneProgressPatch,
    ) -> RepoResult<()> {
        patch.base.validate()?;
        self.update_object(uri, ReservedField::DeleteStatus, patch)
            .await
    }

    // ---- Text index status ----

    pub async fn get_repository_index_status(
        &self,
        uri: &RepositoryUri,
    ) -> RepoResult<IndexWorkerProgress> {
        self.get_object(uri, ReservedField::IndexStatus).await
    }

    pub async fn set_repository_index_status(
        &self,
        uri: &RepositoryUri,
        status: &IndexWorkerProgress,
    ) -> RepoResult<()> {
        status.base.state()?;
        self.set_object(uri, ReservedField::IndexStatus, status).await
    }

    pub async fn update_repository_index_status(
        &self,
        uri: &RepositoryUri,
        patch: &IndexProgressPatch,
    ) -> RepoResult<()> {
        patch.base.validate()?;
        self.update_object(uri, ReservedField::IndexStatus, patch).await
    }

    // ---- Repository config ----

    pub async fn get_repository_config(&self, uri: &RepositoryUri) -> RepoResult<RepositoryConfig> {
        self.get_object(uri, ReservedField::Config).await
    }

    pub async fn set_repository_config(
        &self,
        uri: &RepositoryUri,
        config: &RepositoryConfig,
    ) -> RepoResult<()> {
        self.set_object(uri, ReservedField::Config, config).await
    }

    pub async fn update_repository_config(
        &self,
        uri: &RepositoryUri,
        patch: &RepositoryConfigPatch,
    ) -> RepoResult<()> {
        self.update_object(uri, ReservedField::Config, patch).await
    }

    // ---- Generic access ----

    /// Fetch and decode the object stored under `field`.
    pub async fn get_object<T: DeserializeOwned>(
        &self,
        uri: &RepositoryUri,
        field: ReservedField,
    ) -> RepoResult<T> {
        Ok(self.get_versioned(uri, field).await?.value)
    }

    /// Fetch and decode the object stored under `field` with its version.
    pub async fn get_versioned<T: DeserializeOwned>(
        &self,
        uri: &RepositoryUri,
        field: ReservedField,
    ) -> RepoResult<Versioned<T>> {
        let request = GetRequest {
            index: self.layout.index_name(uri),
            doc_type: self.layout.doc_type().to_string(),
            id: field.as_str().to_string(),
        };
        debug!(index = %request.index, %field, "getting repository object");
        let response = self.store.get(request).await?;
        let value = decode_field(response.source, field, &response.index)?;
        Ok(Versioned {
            value,
            version: response.version,
        })
    }

    /// Replace the document for `field` with `{ field: object }`.
    pub async fn set_object<T: Serialize + ?Sized>(
        &self,
        uri: &RepositoryUri,
        field: ReservedField,
        object: &T,
    ) -> RepoResult<()> {
        let request = IndexRequest {
            index: self.layout.index_name(uri),
            doc_type: self.layout.doc_type().to_string(),
            id: field.as_str().to_string(),
            body: wrap_field(field, object)?,
            if_version: None,
        };
        debug!(index = %request.index, %field, "indexing repository object");
        self.store.index(request).await?;
        Ok(())
    }

    /// Merge `patch` into the object stored under `field`.
    pub async fn update_object<P: Serialize + ?Sized>(
        &self,
        uri: &RepositoryUri,
        field: ReservedField,
        patch: &P,
    ) -> RepoResult<()> {
        self.send_update(uri, field, patch, None).await?;
        Ok(())
    }

    /// Merge `patch` only if the document is still at `version`.
    ///
    /// Returns the new document version. Fails with a version conflict
    /// (see [`RepoError::is_version_conflict`]) if another writer got there
    /// first.
    pub async fn update_if_version<P: Serialize + ?Sized>(
        &self,
        uri: &RepositoryUri,
        field: ReservedField,
        patch: &P,
        version: u64,
    ) -> RepoResult<u64> {
        self.send_update(uri, field, patch, Some(version)).await
    }

    async fn send_update<P: Serialize + ?Sized>(
        &self,
        uri: &RepositoryUri,
        field: ReservedField,
        patch: &P,
        if_version: Option<u64>,
    ) -> RepoResult<u64> {
        let request = UpdateRequest {
            index: self.layout.index_name(uri),
            doc_type: self.layout.doc_type().to_string(),
            id: field.as_str().to_string(),
            doc: wrap_field(field, patch)?,
            if_version,
        };
        debug!(index = %request.index, %field, ?if_version, "updating repository object");
        let response = self.store.update(request).await?;
        Ok(response.version)
    }
}

impl std::fmt::Debug for RepositoryObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryObjectClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Build `{ field: object }`.
fn wrap_field<T: Serialize + ?Sized>(field: ReservedField, object: &T) -> RepoResult<Value> {
    let value =
        serde_json::to_value(object).map_err(|source| RepoError::Encode { field, source })?;
    let mut body = Map::with_capacity(1);
    body.insert(field.as_str().to_string(), value);
    Ok(Value::Object(body))
}

/// Extract and decode `source[field]`.
fn decode_field<T: DeserializeOwned>(
    mut source: Value,
    field: ReservedField,
    index: &str,
) -> RepoResult<T> {
    let value = source
        .get_mut(field.as_str())
        .map(Value::take)
        .filter(|v| !v.is_null())
        .ok_or_else(|| RepoError::FieldMissing {
            index: index.to_string(),
            field,
        })?;
    serde_json::from_value(value).map_err(|source| RepoError::Decode { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use code_model::{CloneProgress, IndexProgress, LspLanguage, ModelError};
    use code_store::{
        GetResponse, InMemoryDocumentStore, SearchResponse, StoreError, StoreResult,
        WriteResponse,
    };
    use serde_json::json;
    use std::sync::Mutex;

    /// A store call as seen by the backend.
    #[derive(Clone, Debug)]
    enum Call {
        Index(IndexRequest),
        Get(GetRequest),
        Update(UpdateRequest),
        Delete(DeleteRequest),
        Search(SearchRequest),
    }

    /// Wraps an in-memory store and records every request it receives.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryDocumentStore,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn last(&self) -> Call {
            self.calls.lock().unwrap().last().cloned().expect("no calls recorded")
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn index(&self, request: IndexRequest) -> StoreResult<WriteResponse> {
            self.record(Call::Index(request.clone()));
            self.inner.index(request).await
        }

        async fn get(&self, request: GetRequest) -> StoreResult<GetResponse> {
            self.record(Call::Get(request.clone()));
            self.inner.get(request).await
        }

        async fn update(&self, request: UpdateRequest) -> StoreResult<WriteResponse> {
            self.record(Call::Update(request.clone()));
            self.inner.update(request).await
        }

        async fn delete(&self, request: DeleteRequest) -> StoreResult<WriteResponse> {
            self.record(Call::Delete(request.clone()));
            self.inner.delete(request).await
        }

        async fn search(&self, request: SearchRequest) -> StoreResult<SearchResponse> {
            self.record(Call::Search(request.clone()));
            self.inner.search(request).await
        }
    }

    /// A store whose backend is unreachable.
    struct UnavailableStore;

    #[async_trait]
    impl DocumentStore for UnavailableStore {
        async fn index(&self, _: IndexRequest) -> StoreResult<WriteResponse> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn get(&self, _: GetRequest) -> StoreResult<GetResponse> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn update(&self, _: UpdateRequest) -> StoreResult<WriteResponse> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn delete(&self, _: DeleteRequest) -> StoreResult<WriteResponse> {
            Err(StoreError::Backend("connection refused".into()))
        }

        async fn search(&self, _: SearchRequest) -> StoreResult<SearchResponse> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    const REPO_URI: &str = "github.com/elastic/code";

    fn setup() -> (Arc<RecordingStore>, RepositoryObjectClient) {
        let store = Arc::new(RecordingStore::default());
        let client = RepositoryObjectClient::new(store.clone());
        (store, client)
    }

    fn uri() -> RepositoryUri {
        RepositoryUri::new(REPO_URI).unwrap()
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 1, 12, 0, 0).unwrap()
    }

    fn code_repo() -> Repository {
        Repository::new(uri(), "https://github.com/elastic/code.git", "elastic", "code")
    }

    fn progress(value: f64) -> WorkerProgress {
        WorkerProgress::new(uri(), value, ts()).unwrap()
    }

    /// Asserts the request addressed the right index, type, and document.
    fn assert_target(index: &str, doc_type: &str, id: &str, field: ReservedField) {
        assert_eq!(index, RepositoryIndexLayout::default().index_name(&uri()));
        assert_eq!(doc_type, "_doc");
        assert_eq!(id, field.as_str());
    }

    // -----------------------------------------------------------------------
    // Repository metadata
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn crud_of_repository() {
        let (store, client) = setup();
        let repo = code_repo();

        // Create
        client.set_repository(&uri(), &repo).await.unwrap();
        match store.last() {
            Call::Index(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::Repository);
                assert_eq!(req.body, json!({ "repository": repo }));
                assert!(req.if_version.is_none());
            }
            other => panic!("expected index call, got {other:?}"),
        }

        // Read
        let read = client.get_repository(&uri()).await.unwrap();
        assert_eq!(read, repo);
        match store.last() {
            Call::Get(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::Repository)
            }
            other => panic!("expected get call, got {other:?}"),
        }

        // Update
        let patch = RepositoryPatch::url("https://github.com/elastic/codesearch.git");
        client.update_repository(&uri(), &patch).await.unwrap();
        match store.last() {
            Call::Update(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::Repository);
                assert_eq!(
                    req.body(),
                    json!({ "doc": { "repository": { "url": "https://github.com/elastic/codesearch.git" } } })
                );
            }
            other => panic!("expected update call, got {other:?}"),
        }
        let updated = client.get_repository(&uri()).await.unwrap();
        assert_eq!(updated.url, "https://github.com/elastic/codesearch.git");
        assert_eq!(updated.org, "elastic");
        assert_eq!(updated.name, "code");
        assert_eq!(updated.uri, uri());

        // Delete
        client.delete_repository(&uri()).await.unwrap();
        match store.last() {
            Call::Delete(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::Repository)
            }
            other => panic!("expected delete call, got {other:?}"),
        }
        let err = client.get_repository(&uri()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn set_replaces_previous_repository() {
        let (_, client) = setup();
        let mut repo = code_repo();
        repo.revision = Some("abc123".into());
        client.set_repository(&uri(), &repo).await.unwrap();

        let replacement = code_repo();
        client.set_repository(&uri(), &replacement).await.unwrap();
        let read = client.get_repository(&uri()).await.unwrap();
        assert!(read.revision.is_none());
    }

    #[tokio::test]
    async fn delete_keeps_status_documents() {
        let (_, client) = setup();
        client.set_repository(&uri(), &code_repo()).await.unwrap();
        let status = CloneWorkerProgress::new(progress(100.0));
        client.set_repository_git_status(&uri(), &status).await.unwrap();

        client.delete_repository(&uri()).await.unwrap();
        assert_eq!(client.get_repository_git_status(&uri()).await.unwrap(), status);
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    async fn register(client: &RepositoryObjectClient, raw: &str) -> Repository {
        let repo = Repository::from_url(&format!("https://{raw}.git")).unwrap();
        client.set_repository(&repo.uri, &repo).await.unwrap();
        let status = CloneWorkerProgress::new(WorkerProgress::new(repo.uri.clone(), 0.0, ts()).unwrap());
        client.set_repository_git_status(&repo.uri, &status).await.unwrap();
        client
            .set_repository_lsp_index_status(&repo.uri, &status.base)
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn get_all_repositories() {
        let (store, client) = setup();
        let mut expected = Vec::new();
        for raw in ["github.com/elastic/code", "github.com/elastic/kibana", "gitlab.com/team/app"] {
            expected.push(register(&client, raw).await);
        }

        let mut repos = client.get_all_repositories().await.unwrap();
        match store.last() {
            Call::Search(req) => {
                assert_eq!(req.index, ".code-repository*");
                assert_eq!(req.doc_type.as_deref(), Some("_doc"));
                assert_eq!(req.query, Query::exists("repository"));
                assert_eq!(req.from, 0);
            }
            other => panic!("expected search call, got {other:?}"),
        }

        // One entry per repository, however many status documents exist.
        assert_eq!(repos.len(), 3);
        repos.sort_by(|a, b| a.uri.cmp(&b.uri));
        expected.sort_by(|a, b| a.uri.cmp(&b.uri));
        assert_eq!(repos, expected);
    }

    #[tokio::test]
    async fn get_all_repositories_when_empty() {
        let (_, client) = setup();
        assert!(client.get_all_repositories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_all_repositories_pages_through_results() {
        let store = Arc::new(RecordingStore::default());
        let config = ClientConfig {
            search_page_size: 2,
            ..ClientConfig::default()
        };
        let client = RepositoryObjectClient::with_config(store.clone(), config).unwrap();
        for i in 0..5 {
            register(&client, &format!("github.com/org/repo{i}")).await;
        }

        let repos = client.get_all_repositories().await.unwrap();
        assert_eq!(repos.len(), 5);

        let froms: Vec<usize> = store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search(req) => Some(req.from),
                _ => None,
            })
            .collect();
        assert_eq!(froms, vec![0, 2, 4]);
    }

    #[tokio::test]
    async fn get_all_repositories_respects_cap() {
        let store = Arc::new(RecordingStore::default());
        let config = ClientConfig {
            search_page_size: 2,
            max_repositories: Some(3),
            ..ClientConfig::default()
        };
        let client = RepositoryObjectClient::with_config(store, config).unwrap();
        for i in 0..5 {
            register(&client, &format!("github.com/org/repo{i}")).await;
        }
        assert_eq!(client.get_all_repositories().await.unwrap().len(), 3);
    }

    // -----------------------------------------------------------------------
    // Worker status
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn crud_of_repository_git_status() {
        let (store, client) = setup();
        let status = CloneWorkerProgress::new(progress(100.0)).with_clone_progress(CloneProgress {
            is_cloned: Some(true),
            received_objects: 42,
            total_objects: 42,
            ..CloneProgress::default()
        });

        client.set_repository_git_status(&uri(), &status).await.unwrap();
        match store.last() {
            Call::Index(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::GitStatus);
                assert_eq!(req.body, json!({ "repository_git_status": status }));
            }
            other => panic!("expected index call, got {other:?}"),
        }
        assert_eq!(client.get_repository_git_status(&uri()).await.unwrap(), status);

        let patch = CloneProgressPatch::from(ProgressPatch::progress(50.0));
        client.update_repository_git_status(&uri(), &patch).await.unwrap();
        match store.last() {
            Call::Update(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::GitStatus);
                assert_eq!(
                    req.body(),
                    json!({ "doc": { "repository_git_status": { "progress": 50.0 } } })
                );
            }
            other => panic!("expected update call, got {other:?}"),
        }

        let updated = client.get_repository_git_status(&uri()).await.unwrap();
        assert_eq!(updated.base.progress, 50.0);
        assert_eq!(updated.base.timestamp, ts());
        assert_eq!(updated.clone_progress, status.clone_progress);
    }

    #[tokio::test]
    async fn crud_of_repository_lsp_index_status() {
        let (store, client) = setup();
        let status = progress(100.0);

        client.set_repository_lsp_index_status(&uri(), &status).await.unwrap();
        match store.last() {
            Call::Index(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::LspIndexStatus);
                assert_eq!(req.body, json!({ "repository_lsp_index_status": status }));
            }
            other => panic!("expected index call, got {other:?}"),
        }
        assert_eq!(client.get_repository_lsp_index_status(&uri()).await.unwrap(), status);

        client
            .update_repository_lsp_index_status(&uri(), &ProgressPatch::progress(50.0).with_revision("HEAD"))
            .await
            .unwrap();
        let updated = client.get_repository_lsp_index_status(&uri()).await.unwrap();
        assert_eq!(updated.progress, 50.0);
        assert_eq!(updated.revision.as_deref(), Some("HEAD"));
        assert_eq!(updated.timestamp, ts());
    }

    #[tokio::test]
    async fn crud_of_repository_delete_status() {
        let (store, client) = setup();
        let status = CloneWorkerProgress::new(progress(100.0));

        client.set_repository_delete_status(&uri(), &status).await.unwrap();
        match store.last() {
            Call::Index(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::DeleteStatus);
                assert_eq!(req.body, json!({ "repository_delete_status": status }));
            }
            other => panic!("expected index call, got {other:?}"),
        }
        assert_eq!(client.get_repository_delete_status(&uri()).await.unwrap(), status);

        let patch = CloneProgressPatch::from(ProgressPatch::progress(50.0));
        client.update_repository_delete_status(&uri(), &patch).await.unwrap();
        match store.last() {
            Call::Update(req) => {
                assert_target(&req.index, &req.doc_type, &req.id, ReservedField::DeleteStatus);
                assert_eq!(
                    req.body(),
                    json!({ "doc": { "repository_delete_status": { "progress": 50.0 } } })
                );
            }
            other => panic!("expected update call, got {other:?}"),
        }
        let updated = client.get_repository_delete_status(&uri()).await.unwrap();
        assert_eq!(updated.base.progress, 50.0);
    }

    #[tokio::test]
    async fn crud_of_repository_index_status() {
        let (_, client) = setup();
        let status = IndexWorkerProgress {
            base: progress(10.0),
            index_progress: Some(IndexProgress {
                kind: "file".into(),
                total: 100,
                success: 10,
                fail: 0,
                percentage: 10.0,
            }),
        };
        client.set_repository_index_status(&uri(), &status).await.unwrap();
        assert_eq!(client.get_repository_index_status(&uri()).await.unwrap(), status);

        let patch = IndexProgressPatch::from(ProgressPatch::progress(100.0));
        client.update_repository_index_status(&uri(), &patch).await.unwrap();
        let updated = client.get_repository_index_status(&uri()).await.unwrap();
        assert_eq!(updated.base.progress, 100.0);
        assert_eq!(updated.index_progress, status.index_progress);
    }

    #[tokio::test]
    async fn crud_of_repository_config() {
        let (_, client) = setup();
        let config = RepositoryConfig::new(uri());
        client.set_repository_config(&uri(), &config).await.unwrap();

        let patch = RepositoryConfigPatch::disable(LspLanguage::Java, true);
        client.update_repository_config(&uri(), &patch).await.unwrap();
        let updated = client.get_repository_config(&uri()).await.unwrap();
        assert!(updated.is_disabled(LspLanguage::Java));
        assert!(!updated.is_disabled(LspLanguage::Go));
    }

    #[tokio::test]
    async fn objects_of_one_repository_share_an_index() {
        let (store, client) = setup();
        register(&client, REPO_URI).await;
        let indices: Vec<String> = store
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Index(req) => Some(req.index),
                _ => None,
            })
            .collect();
        assert_eq!(indices.len(), 3);
        assert!(indices.iter().all(|i| *i == indices[0]));
        assert_eq!(store.inner.index_names().unwrap().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_before_set_is_not_found() {
        let (_, client) = setup();
        let err = client.get_repository_git_status(&uri()).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, RepoError::Store(StoreError::IndexNotFound(_))));

        client.set_repository(&uri(), &code_repo()).await.unwrap();
        let err = client.get_repository_git_status(&uri()).await.unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn update_before_set_is_not_found() {
        let (_, client) = setup();
        client.set_repository(&uri(), &code_repo()).await.unwrap();
        let patch = CloneProgressPatch::from(ProgressPatch::progress(10.0));
        let err = client.update_repository_git_status(&uri(), &patch).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn document_without_field_is_not_found() {
        let (store, client) = setup();
        store
            .inner
            .index(IndexRequest {
                index: client.layout().index_name(&uri()),
                doc_type: "_doc".into(),
                id: "repository".into(),
                body: json!({ "unrelated": true }),
                if_version: None,
            })
            .await
            .unwrap();
        let err = client.get_repository(&uri()).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::FieldMissing {
                field: ReservedField::Repository,
                ..
            }
        ));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn malformed_field_fails_to_decode() {
        let (_, client) = setup();
        client
            .set_object(&uri(), ReservedField::Repository, &json!({ "uri": 7 }))
            .await
            .unwrap();
        let err = client.get_repository(&uri()).await.unwrap_err();
        assert!(matches!(err, RepoError::Decode { .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn invalid_progress_never_reaches_store() {
        let (store, client) = setup();
        let patch = CloneProgressPatch::from(ProgressPatch::progress(250.0));
        let err = client.update_repository_git_status(&uri(), &patch).await.unwrap_err();
        assert!(matches!(err, RepoError::Model(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_progress_record_is_never_stored() {
        let (store, client) = setup();
        let mut status = progress(0.0);
        status.progress = 250.0;

        let err = client.set_repository_lsp_index_status(&uri(), &status).await.unwrap_err();
        assert!(matches!(err, RepoError::Model(ModelError::InvalidProgress(_))));
        let clone = CloneWorkerProgress::new(status.clone());
        assert!(client.set_repository_git_status(&uri(), &clone).await.is_err());
        assert!(client.set_repository_delete_status(&uri(), &clone).await.is_err());
        let index = IndexWorkerProgress::new(status);
        assert!(client.set_repository_index_status(&uri(), &index).await.is_err());
        assert!(store.calls().is_empty());

        let err = client.get_repository_lsp_index_status(&uri()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn long_uri_is_stored_and_listed() {
        let (_, client) = setup();
        let long = RepositoryUri::new(format!("github.com/org/{}", "a".repeat(230))).unwrap();
        let repo = Repository::new(long.clone(), "https://github.com/org/long.git", "org", "long");
        client.set_repository(&long, &repo).await.unwrap();
        assert_eq!(client.get_repository(&long).await.unwrap(), repo);
        assert_eq!(client.get_all_repositories().await.unwrap(), vec![repo]);
    }

    #[tokio::test]
    async fn store_failures_propagate_unchanged() {
        let client = RepositoryObjectClient::new(Arc::new(UnavailableStore));
        let err = client.set_repository(&uri(), &code_repo()).await.unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Backend(_))));
        let err = client.get_all_repositories().await.unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Backend(_))));
        assert!(!err.is_not_found());
    }

    #[test]
    fn with_config_rejects_invalid_config() {
        let config = ClientConfig {
            search_page_size: 0,
            ..ClientConfig::default()
        };
        let err = RepositoryObjectClient::with_config(Arc::new(UnavailableStore), config).unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn conditional_update_detects_lost_update() {
        let (_, client) = setup();
        client
            .set_repository_lsp_index_status(&uri(), &progress(0.0))
            .await
            .unwrap();

        let seen: Versioned<WorkerProgress> = client
            .get_versioned(&uri(), ReservedField::LspIndexStatus)
            .await
            .unwrap();
        assert_eq!(seen.version, 1);

        // Another worker reports first.
        client
            .update_repository_lsp_index_status(&uri(), &ProgressPatch::progress(30.0))
            .await
            .unwrap();

        let err = client
            .update_if_version(&uri(), ReservedField::LspIndexStatus, &ProgressPatch::progress(20.0), seen.version)
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());

        let fresh: Versioned<WorkerProgress> = client
            .get_versioned(&uri(), ReservedField::LspIndexStatus)
            .await
            .unwrap();
        assert_eq!(fresh.value.progress, 30.0);
        let version = client
            .update_if_version(&uri(), ReservedField::LspIndexStatus, &ProgressPatch::progress(40.0), fresh.version)
            .await
            .unwrap();
        assert_eq!(version, fresh.version + 1);
    }

    #[tokio::test]
    async fn concurrent_unconditional_updates_all_apply() {
        let (_, client) = setup();
        let client = Arc::new(client);
        client
            .set_repository_lsp_index_status(&uri(), &progress(0.0))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 1..=10 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                let patch = ProgressPatch::progress(f64::from(i) * 10.0);
                client.update_repository_lsp_index_status(&uri(), &patch).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let last: Versioned<WorkerProgress> = client
            .get_versioned(&uri(), ReservedField::LspIndexStatus)
            .await
            .unwrap();
        assert_eq!(last.version, 11);
        assert!((10.0..=100.0).contains(&last.value.progress));
        assert_eq!(last.value.timestamp, ts());
    }
}
