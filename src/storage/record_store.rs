//! Record persistence
//!
//! Writes one physician record per call, keyed by the record's natural
//! identity so that re-crawling a physician overwrites the earlier document.

use crate::record::PhysicianRecord;
use crate::storage::{SearchBackend, SearchError};
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Result of a `put` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The record was written under `id`
    Stored { id: String },

    /// The record could not be written
    Failed,
}

impl StoreOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Writes physician records into a provisioned index
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn SearchBackend>,
    document_type: String,
    backoff: ExponentialBuilder,
}

impl RecordStore {
    /// Creates a store writing documents of `document_type`
    ///
    /// Transient backend errors are retried up to `max_retries` times.
    pub fn new(backend: Arc<dyn SearchBackend>, document_type: &str, max_retries: u32) -> Self {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(max_retries as usize)
            .with_jitter();

        Self {
            backend,
            document_type: document_type.to_string(),
            backoff,
        }
    }

    /// Replaces the retry policy
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    /// Writes `record` into `index`
    ///
    /// Never raises: serialization and backend errors are logged and
    /// reported as [`StoreOutcome::Failed`].
    pub async fn put(&self, index: &str, record: &PhysicianRecord) -> StoreOutcome {
        let body = match serde_json::to_value(record) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to serialize record: {}", e);
                return StoreOutcome::Failed;
            }
        };

        let id = record.document_id();
        let backend = &self.backend;
        let document_type = self.document_type.as_str();
        let doc_id = id.as_str();
        let body = &body;

        let attempt = || async move {
            backend
                .index_document(index, document_type, doc_id, body)
                .await
        };

        let result = attempt
            .retry(self.backoff.clone())
            .sleep(sleep)
            .when(SearchError::is_transient)
            .notify(|err: &SearchError, delay: Duration| {
                tracing::warn!(
                    index,
                    document_id = doc_id,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying document write"
                );
            })
            .await;

        match result {
            Ok(stored_id) => {
                tracing::debug!("Stored document {} in {}", stored_id, index);
                StoreOutcome::Stored { id: stored_id }
            }
            Err(e) => {
                tracing::error!("Error indexing document {} into {}: {}", id, index, e);
                StoreOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{IndexSchema, MemoryBackend};

    fn jane() -> PhysicianRecord {
        PhysicianRecord {
            full_name: Some("Jane Doe".to_string()),
            office_location: Some("Newark, NJ".to_string()),
            ..PhysicianRecord::default()
        }
    }

    async fn provisioned() -> Arc<MemoryBackend> {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .create_index("physicians", &IndexSchema::physicians(1, 0))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_put_stores_under_document_id() {
        let backend = provisioned().await;
        let store = RecordStore::new(backend.clone(), "_doc", 0);
        let record = jane();

        let outcome = store.put("physicians", &record).await;
        assert_eq!(
            outcome,
            StoreOutcome::Stored {
                id: record.document_id()
            }
        );

        let stored = backend.document("physicians", &record.document_id()).unwrap();
        assert_eq!(stored["full_name"], "Jane Doe");
        assert!(stored["overview"].is_null());
    }

    #[tokio::test]
    async fn test_repeated_put_upserts() {
        let backend = provisioned().await;
        let store = RecordStore::new(backend.clone(), "_doc", 0);

        assert!(store.put("physicians", &jane()).await.is_stored());
        assert!(store.put("physicians", &jane()).await.is_stored());
        assert_eq!(backend.document_count("physicians"), 1);
    }

    #[tokio::test]
    async fn test_write_error_is_reported_not_raised() {
        let backend = provisioned().await;
        backend.fail_writes_for("Jane Doe");
        let store = RecordStore::new(backend.clone(), "_doc", 3);

        assert_eq!(store.put("physicians", &jane()).await, StoreOutcome::Failed);
        // Client errors are not retried
        assert_eq!(backend.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_index_fails() {
        let backend = Arc::new(MemoryBackend::new());
        let store = RecordStore::new(backend, "_doc", 0);

        assert_eq!(store.put("physicians", &jane()).await, StoreOutcome::Failed);
    }
}
