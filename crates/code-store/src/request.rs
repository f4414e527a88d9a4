//! Request and response types for the five document store primitives.
//!
//! Bodies are untyped JSON ([`serde_json::Value`]); typed encoding belongs to
//! the callers. Field names on the serialized responses follow the backend's
//! wire names (`_index`, `_id`, `_version`, `_source`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Full-document write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub index: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
    pub body: Value,
    /// Expected current version; `None` writes unconditionally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_version: Option<u64>,
}

/// Single-document fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub index: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
}

/// Partial-document update. `doc` is deep-merged into the stored source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub index: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
    pub doc: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_version: Option<u64>,
}

impl UpdateRequest {
    /// The request body as sent over the wire: `{ "doc": ... }`.
    pub fn body(&self) -> Value {
        json!({ "doc": self.doc })
    }
}

/// Single-document delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub index: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
}

/// Query clause of a search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Every document matches.
    #[default]
    MatchAll,
    /// Documents whose source has a non-null top-level `field`.
    Exists { field: String },
}

impl Query {
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    /// Evaluate the query against a document source.
    pub fn matches(&self, source: &Value) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Exists { field } => source.get(field).is_some_and(|v| !v.is_null()),
        }
    }
}

/// Search over one or more indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Comma-separated index names or `*` patterns.
    pub index: String,
    /// Restrict hits to one document type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub query: Query,
    #[serde(default)]
    pub from: usize,
    pub size: usize,
}

impl SearchRequest {
    /// A `match_all` search returning at most `size` hits.
    pub fn new(index: impl Into<String>, size: usize) -> Self {
        Self {
            index: index.into(),
            doc_type: None,
            query: Query::MatchAll,
            from: 0,
            size,
        }
    }

    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }
}

/// Result of a successful `get`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    #[serde(rename = "_source")]
    pub source: Value,
}

/// What a write did to the target document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Created,
    Updated,
    Deleted,
    /// The update left the source unchanged.
    Noop,
}

/// Result of a successful `index`, `update`, or `delete`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    pub result: WriteOutcome,
}

/// One search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    #[serde(rename = "_source")]
    pub source: Value,
}

/// Result of a `search`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Number of matching documents before paging.
    pub total: usize,
    pub hits: Vec<SearchHit>,
}
