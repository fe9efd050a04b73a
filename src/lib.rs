//! Physician-Indexer: a polite directory scraper that feeds a search index
//!
//! This crate crawls a single listing page, follows each detail-page link it
//! finds, extracts a fixed set of physician fields with CSS selectors and
//! stores one document per page in an Elasticsearch index.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-link failures never surface here; they are recorded in the
/// [`output::CrawlReport`] instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Search backend error: {0}")]
    Search(#[from] storage::SearchError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for {field}: {message}")]
    InvalidSelector { field: String, message: String },
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlTarget};
pub use output::CrawlReport;
pub use record::{PhysicianRecord, SelectorRules};
pub use state::{LinkState, RunPhase};
