use crate::config::types::{Config, CrawlerConfig, SearchConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent(&config.user_agent.value)?;
    validate_search_config(&config.search)?;
    config.selectors.validate()?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("listing-url", &config.listing_url)?;

    Selector::parse(&config.link_selector).map_err(|e| ConfigError::InvalidSelector {
        field: "link-selector".to_string(),
        message: e.to_string(),
    })?;

    if config.request_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be >= 100ms, got {}ms",
            config.request_delay_ms
        )));
    }

    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent(value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    if !value.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return Err(ConfigError::Validation(format!(
            "user agent contains characters not allowed in a header: '{}'",
            value
        )));
    }

    Ok(())
}

/// Validates search backend configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    validate_http_url("search.url", &config.url)?;
    validate_index_name(&config.index)?;

    if config.document_type.is_empty() || config.document_type.contains('/') {
        return Err(ConfigError::Validation(format!(
            "document_type must be a non-empty path segment, got '{}'",
            config.document_type
        )));
    }

    if config.shards < 1 {
        return Err(ConfigError::Validation(format!(
            "shards must be >= 1, got {}",
            config.shards
        )));
    }

    if config.aggregation_size < 1 {
        return Err(ConfigError::Validation(format!(
            "aggregation_size must be >= 1, got {}",
            config.aggregation_size
        )));
    }

    Ok(())
}

/// Validates an index name against the backend's naming rules
fn validate_index_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "index name cannot be empty".to_string(),
        ));
    }

    if name.starts_with(['-', '_', '+']) {
        return Err(ConfigError::Validation(format!(
            "index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }

    if name.chars().any(|c| {
        c.is_ascii_uppercase() || c.is_whitespace() || "\\/*?\"<>|,#:".contains(c)
    }) {
        return Err(ConfigError::Validation(format!(
            "index name '{}' must be lowercase without spaces or special characters",
            name
        )));
    }

    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", key, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}
