use crate::record::SelectorRules;
use serde::Deserialize;

/// Main configuration structure for Physician-Indexer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub selectors: SelectorRules,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// The directory page enumerating detail-page links
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// CSS selector matching the detail-page anchors on the listing page
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,

    /// Minimum time between two outgoing detail-page requests (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Number of links processed concurrently
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Retries for transient fetch and store failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Request identification sent with every page fetch
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    #[serde(default = "default_user_agent")]
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
        }
    }
}

/// Search backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the Elasticsearch node
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Target index name
    #[serde(default = "default_index")]
    pub index: String,

    /// Document type segment used in write paths
    #[serde(rename = "document-type", default = "default_document_type")]
    pub document_type: String,

    #[serde(default = "default_shards")]
    pub shards: u32,

    #[serde(default)]
    pub replicas: u32,

    /// Run the `full_name` term aggregation once the crawl is done
    #[serde(rename = "aggregate-after-run", default = "default_true")]
    pub aggregate_after_run: bool,

    /// Maximum number of buckets returned by term aggregations
    #[serde(rename = "aggregation-size", default = "default_aggregation_size")]
    pub aggregation_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            index: default_index(),
            document_type: default_document_type(),
            shards: default_shards(),
            replicas: 0,
            aggregate_after_run: true,
            aggregation_size: default_aggregation_size(),
        }
    }
}

fn default_link_selector() -> String {
    ".List__ListWrap-e439ne-0 .List__ListItem-e439ne-1 a".to_string()
}

fn default_request_delay_ms() -> u64 {
    2000
}

fn default_workers() -> u32 {
    1
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_6) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/66.0.3359.181 Safari/537.36"
        .to_string()
}

fn default_search_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "physicians".to_string()
}

fn default_document_type() -> String {
    "_doc".to_string()
}

fn default_shards() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_aggregation_size() -> u32 {
    10
}
