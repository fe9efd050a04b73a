//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Request pacing shared by all workers
//! - Detail link extraction from the listing page
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod links;
mod pacer;

pub use coordinator::{Coordinator, LinkOutcome, SkipReason};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use links::{extract_links, CrawlTarget};
pub use pacer::RequestPacer;
