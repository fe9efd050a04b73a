//! Elasticsearch REST implementation of the search backend
//!
//! Requests used:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | health | `GET /_cluster/health?wait_for_status=yellow&timeout=1s` |
//! | exists | `HEAD /{index}` |
//! | create | `PUT /{index}` |
//! | write | `PUT /{index}/{type}/{id}` |
//! | search | `POST /{index}/_search` |

use crate::storage::{CreateOutcome, IndexSchema, SearchBackend, SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Error type the backend returns when creating an index that exists
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// Search backend speaking the Elasticsearch REST API
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: Client,
    base_url: String,
}

impl ElasticsearchBackend {
    /// Creates a backend for the node at `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Node address, e.g. `http://localhost:9200`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    async fn health(&self) -> SearchResult<()> {
        let response = self
            .client
            .get(self.endpoint("_cluster/health"))
            .query(&[("wait_for_status", "yellow"), ("timeout", "1s")])
            .send()
            .await?;

        let body = json_body(response).await?;
        match body.get("status").and_then(Value::as_str) {
            Some("green") | Some("yellow") => Ok(()),
            Some(status) => Err(SearchError::Unavailable(format!(
                "cluster status is {}",
                status
            ))),
            None => Err(SearchError::Decode(
                "health response has no status".to_string(),
            )),
        }
    }

    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let response = self.client.head(self.endpoint(index)).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchError::Status {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> SearchResult<CreateOutcome> {
        let response = self
            .client
            .put(self.endpoint(index))
            .json(&schema.to_body())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(CreateOutcome::Created);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains(ALREADY_EXISTS_ERROR) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        Err(SearchError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn index_document(
        &self,
        index: &str,
        document_type: &str,
        id: &str,
        body: &Value,
    ) -> SearchResult<String> {
        let response = self
            .client
            .put(self.endpoint(&format!("{}/{}/{}", index, document_type, id)))
            .json(body)
            .send()
            .await?;

        let reply = json_body(response).await?;
        Ok(reply
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or(id)
            .to_string())
    }

    async fn search(&self, index: &str, query: &Value) -> SearchResult<Value> {
        let response = self
            .client
            .post(self.endpoint(&format!("{}/_search", index)))
            .json(query)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SearchError::IndexNotFound(index.to_string()));
        }

        json_body(response).await
    }
}

/// Decodes a successful JSON response, or turns the status into an error
async fn json_body(response: Response) -> SearchResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::Decode(e.to_string()))
}
