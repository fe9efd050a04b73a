//! Search backend trait and error types
//!
//! This module defines the boundary to the document search engine. The
//! crawler only talks to the engine through [`SearchBackend`], so tests can
//! substitute the in-memory implementation.

use crate::storage::IndexSchema;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while talking to the search backend
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl SearchError {
    /// Returns true if retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unavailable(_) => true,
            Self::IndexNotFound(_) | Self::Decode(_) => false,
        }
    }
}

/// Result type for search backend operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Result of an index creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The index was created by this request
    Created,

    /// The backend reported that the index already exists
    AlreadyExists,
}

/// Trait for search backend implementations
///
/// Implementations must be shareable across worker tasks.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Checks that the backend is reachable and able to serve requests
    async fn health(&self) -> SearchResult<()>;

    /// Checks whether an index exists
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Creates an index with the given schema
    ///
    /// An "already exists" answer from the backend is not an error; it is
    /// reported as [`CreateOutcome::AlreadyExists`].
    async fn create_index(&self, index: &str, schema: &IndexSchema) -> SearchResult<CreateOutcome>;

    /// Writes a document under `id`, replacing any document with the same id
    ///
    /// # Returns
    ///
    /// The identifier the backend stored the document under
    async fn index_document(
        &self,
        index: &str,
        document_type: &str,
        id: &str,
        body: &Value,
    ) -> SearchResult<String>;

    /// Runs a search request and returns the raw response body
    async fn search(&self, index: &str, query: &Value) -> SearchResult<Value>;
}
