//! Term aggregation queries
//!
//! Read-only diagnostics over the index: bucket documents by the distinct
//! values of one field and count them.

use crate::storage::{SearchBackend, SearchError, KEYWORD_SUBFIELD};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// One distinct value of the aggregated field with its document count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermBucket {
    pub key: String,
    pub doc_count: u64,
}

/// Runs term aggregations against the search backend
#[derive(Clone)]
pub struct AggregationQuery {
    backend: Arc<dyn SearchBackend>,
    size: u32,
}

impl AggregationQuery {
    /// Creates a query service returning at most `size` buckets per query
    pub fn new(backend: Arc<dyn SearchBackend>, size: u32) -> Self {
        Self { backend, size }
    }

    /// Counts documents per distinct value of `field` across `index`
    ///
    /// Buckets come back in backend order: highest count first.
    pub async fn terms_aggregation(
        &self,
        index: &str,
        field: &str,
    ) -> Result<Vec<TermBucket>, SearchError> {
        let query = build_terms_query(field, self.size);
        let response = self.backend.search(index, &query).await?;
        parse_buckets(&response, field)
    }
}

/// Builds the search body for a terms aggregation named after `field`
///
/// Only `field` is requested from `_source`, and the aggregation runs on the
/// field's keyword sub-field.
pub fn build_terms_query(field: &str, size: u32) -> Value {
    let mut aggs = Map::new();
    aggs.insert(
        field.to_string(),
        json!({
            "terms": {
                "field": format!("{}.{}", field, KEYWORD_SUBFIELD),
                "size": size
            }
        }),
    );

    json!({
        "_source": [field],
        "size": 0,
        "aggs": aggs
    })
}

/// Extracts the buckets of aggregation `name` from a search response
pub fn parse_buckets(response: &Value, name: &str) -> Result<Vec<TermBucket>, SearchError> {
    let buckets = response
        .get("aggregations")
        .and_then(|aggs| aggs.get(name))
        .and_then(|agg| agg.get("buckets"))
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::Decode(format!("response has no buckets for {}", name)))?;

    buckets
        .iter()
        .map(|bucket| {
            let key = match bucket.get("key") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => return Err(SearchError::Decode("bucket has no key".to_string())),
            };
            let doc_count = bucket
                .get("doc_count")
                .and_then(Value::as_u64)
                .ok_or_else(|| SearchError::Decode("bucket has no doc_count".to_string()))?;

            Ok(TermBucket { key, doc_count })
        })
        .collect()
}
