//! In-memory search backend
//!
//! Keeps indices and documents in process memory. It answers the same
//! requests as the Elasticsearch backend (including `terms` aggregations)
//! and can be told to fail, so crawl behavior can be exercised without a
//! running search engine.

use crate::storage::{
    CreateOutcome, IndexSchema, SearchBackend, SearchError, SearchResult, KEYWORD_SUBFIELD,
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryIndex {
    schema: Option<IndexSchema>,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct MemoryState {
    indices: HashMap<String, MemoryIndex>,
    create_calls: usize,
    write_calls: usize,
    unhealthy: bool,
    failing_creates: usize,
    failing_names: HashSet<String>,
}

/// Search backend holding everything in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the health check fail
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.lock().unhealthy = unhealthy;
    }

    /// Makes the next `count` index creations fail with a server error
    pub fn fail_next_creates(&self, count: usize) {
        self.lock().failing_creates = count;
    }

    /// Makes writes of documents whose `full_name` equals `name` fail
    pub fn fail_writes_for(&self, name: &str) {
        self.lock().failing_names.insert(name.to_string());
    }

    /// Number of create-index requests received
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    /// Number of document writes received, including failed ones
    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    /// Number of indices currently held
    pub fn index_count(&self) -> usize {
        self.lock().indices.len()
    }

    /// Number of documents stored in `index`
    pub fn document_count(&self, index: &str) -> usize {
        self.lock()
            .indices
            .get(index)
            .map_or(0, |idx| idx.documents.len())
    }

    /// Returns a stored document by id
    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.lock()
            .indices
            .get(index)
            .and_then(|idx| idx.documents.get(id).cloned())
    }

    /// Returns every stored document in id order
    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.lock()
            .indices
            .get(index)
            .map(|idx| idx.documents.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SearchBackend for MemoryBackend {
    async fn health(&self) -> SearchResult<()> {
        if self.lock().unhealthy {
            return Err(SearchError::Unavailable("memory backend marked unhealthy".to_string()));
        }
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        Ok(self.lock().indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> SearchResult<CreateOutcome> {
        let mut state = self.lock();
        state.create_calls += 1;

        if state.failing_creates > 0 {
            state.failing_creates -= 1;
            return Err(SearchError::Status {
                status: 500,
                body: "injected create failure".to_string(),
            });
        }

        if state.indices.contains_key(index) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        state.indices.insert(
            index.to_string(),
            MemoryIndex {
                schema: Some(schema.clone()),
                documents: BTreeMap::new(),
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn index_document(
        &self,
        index: &str,
        _document_type: &str,
        id: &str,
        body: &Value,
    ) -> SearchResult<String> {
        let mut state = self.lock();
        state.write_calls += 1;

        let name = body.get("full_name").and_then(Value::as_str);
        if name.is_some_and(|n| state.failing_names.contains(n)) {
            return Err(SearchError::Status {
                status: 400,
                body: "injected write failure".to_string(),
            });
        }

        let target = state
            .indices
            .get_mut(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        // Strict mapping: reject attributes the schema does not declare
        if let (Some(schema), Some(object)) = (&target.schema, body.as_object()) {
            if let Some(unknown) = object.keys().find(|k| !schema.has_field(k)) {
                return Err(SearchError::Status {
                    status: 400,
                    body: format!("strict_dynamic_mapping_exception: {}", unknown),
                });
            }
        }

        target.documents.insert(id.to_string(), body.clone());
        Ok(id.to_string())
    }

    async fn search(&self, index: &str, query: &Value) -> SearchResult<Value> {
        let state = self.lock();
        let target = state
            .indices
            .get(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let mut aggregations = Map::new();
        if let Some(aggs) = query.get("aggs").and_then(Value::as_object) {
            for (name, definition) in aggs {
                let terms = definition
                    .get("terms")
                    .ok_or_else(|| SearchError::Decode(format!("aggregation {} is not terms", name)))?;
                let field = terms
                    .get("field")
                    .and_then(Value::as_str)
                    .ok_or_else(|| SearchError::Decode(format!("aggregation {} has no field", name)))?;
                let size = terms.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;

                let buckets = terms_buckets(target.documents.values(), field, size);
                aggregations.insert(name.clone(), json!({ "buckets": buckets }));
            }
        }

        Ok(json!({
            "hits": {
                "total": { "value": target.documents.len() },
                "hits": []
            },
            "aggregations": aggregations
        }))
    }
}

/// Counts distinct values of `field` the way a keyword terms aggregation does
fn terms_buckets<'a>(
    documents: impl Iterator<Item = &'a Value>,
    field: &str,
    size: usize,
) -> Vec<Value> {
    let source_field = field
        .strip_suffix(&format!(".{}", KEYWORD_SUBFIELD))
        .unwrap_or(field);

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for document in documents {
        if let Some(value) = document.get(source_field).and_then(Value::as_str) {
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<(&str, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    sorted
        .into_iter()
        .take(size)
        .map(|(key, count)| json!({ "key": key, "doc_count": count }))
        .collect()
}
