//! Storage module for persisting physician records
//!
//! This module handles everything on the search-engine side of the crawl:
//! - The [`SearchBackend`] boundary and its Elasticsearch and in-memory implementations
//! - The index schema
//! - Idempotent index provisioning
//! - Record writes keyed by physician identity
//! - Term aggregation queries

mod aggregation;
mod elasticsearch;
mod memory;
mod provisioner;
mod record_store;
mod schema;
mod traits;

pub use aggregation::{build_terms_query, parse_buckets, AggregationQuery, TermBucket};
pub use elasticsearch::ElasticsearchBackend;
pub use memory::MemoryBackend;
pub use provisioner::{IndexProvisioner, ProvisionOutcome};
pub use record_store::{RecordStore, StoreOutcome};
pub use schema::{IndexSchema, KEYWORD_SUBFIELD};
pub use traits::{CreateOutcome, SearchBackend, SearchError, SearchResult};

use crate::config::SearchConfig;
use std::sync::Arc;
use std::time::Duration;

/// Opens the Elasticsearch backend described by the configuration
///
/// # Arguments
///
/// * `config` - The search section of the configuration
/// * `timeout` - Per-request timeout
pub fn open_backend(
    config: &SearchConfig,
    timeout: Duration,
) -> Result<Arc<dyn SearchBackend>, SearchError> {
    Ok(Arc::new(ElasticsearchBackend::new(&config.url, timeout)?))
}
