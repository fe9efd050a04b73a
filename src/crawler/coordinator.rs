//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl run that coordinates every step:
//! - Checking the search backend before any page is requested
//! - Fetching the listing page and extracting detail links
//! - Fetching, extracting and storing each detail page in isolation
//! - Provisioning the index before the first store
//! - Handling cancellation
//! - Running the post-crawl aggregation

use crate::config::Config;
use crate::crawler::{build_http_client, extract_links, CrawlTarget, Fetcher, RequestPacer};
use crate::output::CrawlReport;
use crate::record::{extract_record, CompiledSelectors, Field};
use crate::state::{LinkState, RunPhase};
use crate::storage::{
    open_backend, AggregationQuery, IndexProvisioner, IndexSchema, ProvisionOutcome, RecordStore,
    SearchBackend, StoreOutcome,
};
use crate::{ConfigError, CrawlError};
use futures::stream::{self, StreamExt};
use scraper::Selector;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Why a link did not end up in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The detail page could not be fetched
    Fetch(String),

    /// The index could not be provisioned
    Provision,

    /// The record could not be written
    Store,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Provision => "provision",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(message) => write!(f, "fetch failed: {}", message),
            Self::Provision => write!(f, "index provisioning failed"),
            Self::Store => write!(f, "record store failed"),
        }
    }
}

/// Final result of processing one detail link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Indexed { url: String, id: String },
    Skipped { url: String, reason: SkipReason },
    Cancelled { url: String },
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    listing_url: Url,
    fetcher: Fetcher,
    link_selector: Selector,
    selectors: CompiledSelectors,
    backend: Arc<dyn SearchBackend>,
    provisioner: IndexProvisioner,
    store: RecordStore,
    schema: IndexSchema,
    provisioned: OnceCell<ProvisionOutcome>,
    cancel: CancellationToken,
    phase: RunPhase,
}

impl Coordinator {
    /// Creates a coordinator writing to the configured Elasticsearch node
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Failed to build the HTTP clients
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let timeout = Duration::from_secs(config.crawler.timeout_secs);
        let backend = open_backend(&config.search, timeout)?;
        Self::with_backend(config, backend)
    }

    /// Creates a coordinator writing to an explicit search backend
    ///
    /// Selectors and URLs are checked here; the remaining configuration
    /// rules are left to [`crate::config::validate`].
    pub fn with_backend(
        config: Config,
        backend: Arc<dyn SearchBackend>,
    ) -> Result<Self, CrawlError> {
        let listing_url = Url::parse(&config.crawler.listing_url)?;
        let link_selector = Selector::parse(&config.crawler.link_selector).map_err(|e| {
            ConfigError::InvalidSelector {
                field: "link-selector".to_string(),
                message: e.to_string(),
            }
        })?;
        let selectors = config.selectors.compile()?;

        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.timeout_secs),
        )?;
        let pacer = Arc::new(RequestPacer::new(Duration::from_millis(
            config.crawler.request_delay_ms,
        )));
        let fetcher = Fetcher::new(client, pacer, config.crawler.max_retries);

        let provisioner = IndexProvisioner::new(backend.clone());
        let store = RecordStore::new(
            backend.clone(),
            &config.search.document_type,
            config.crawler.max_retries,
        );
        let schema = IndexSchema::physicians(config.search.shards, config.search.replicas);

        Ok(Self {
            config: Arc::new(config),
            listing_url,
            fetcher,
            link_selector,
            selectors,
            backend,
            provisioner,
            store,
            schema,
            provisioned: OnceCell::new(),
            cancel: CancellationToken::new(),
            phase: RunPhase::Init,
        })
    }

    /// Uses `token` to stop the run early
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run before the next link starts
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current run phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Runs the crawl
    ///
    /// 1. Checks that the search backend is reachable
    /// 2. Fetches the listing page and extracts detail links
    /// 3. Processes every link: fetch, extract, provision, store
    /// 4. Optionally runs the `full_name` aggregation
    ///
    /// Per-link failures are recorded in the report and never abort the run.
    /// A listing page that cannot be fetched ends the run with zero links.
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        self.phase = RunPhase::Init;
        self.provisioned = OnceCell::new();

        let index = self.config.search.index.clone();
        let mut report = CrawlReport::new(self.listing_url.as_str(), &index);

        self.backend.health().await?;
        tracing::info!("Search backend is healthy");

        tracing::info!("Fetching listing page {}", self.listing_url);
        let listing = match self.fetcher.fetch(self.listing_url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Failed to fetch listing page: {}", e);
                report.mark_listing_failed(e.to_string());
                self.advance(RunPhase::Done);
                report.finish();
                return Ok(report);
            }
        };
        self.advance(RunPhase::ListingFetched);

        let links = extract_links(&listing.body, &self.link_selector, &self.listing_url);
        report.links_found = links.len();
        tracing::info!("Found {} detail links", links.len());

        let workers = self.config.crawler.workers.max(1) as usize;
        let this = &*self;
        let mut outcomes =
            stream::iter(links.iter().map(|target| this.process_link(target))).buffer_unordered(workers);

        while let Some(outcome) = outcomes.next().await {
            report.record(&outcome);
        }
        drop(outcomes);

        report.provision = self.provisioned.get().copied();
        self.advance(RunPhase::Done);

        tracing::info!(
            "Crawl completed: {} indexed, {} skipped, {} cancelled",
            report.indexed,
            report.skipped_count(),
            report.cancelled
        );

        if self.config.search.aggregate_after_run && report.indexed > 0 {
            let query = AggregationQuery::new(
                self.backend.clone(),
                self.config.search.aggregation_size,
            );
            match query
                .terms_aggregation(&index, Field::FullName.name())
                .await
            {
                Ok(buckets) => report.aggregation = Some(buckets),
                Err(e) => tracing::warn!("Aggregation on {} failed: {}", index, e),
            }
        }

        report.finish();
        Ok(report)
    }

    /// Processes a single detail link
    ///
    /// This method:
    /// 1. Fetches the page
    /// 2. Extracts the record
    /// 3. Ensures the index exists
    /// 4. Stores the record
    ///
    /// Every failure ends the link as skipped.
    async fn process_link(&self, target: &CrawlTarget) -> LinkOutcome {
        let url = target.to_string();

        if self.cancel.is_cancelled() {
            tracing::debug!("Run cancelled, not starting {}", url);
            return LinkOutcome::Cancelled { url };
        }

        let state = LinkState::Fetching;

        let page = match self.fetcher.fetch(target.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                return skip(state, url, SkipReason::Fetch(e.to_string()));
            }
        };

        let mut record = extract_record(&page.body, &self.selectors);
        record.source_url = Some(page.final_url);
        let state = step(state, LinkState::Parsed);
        tracing::debug!(
            "Extracted {} of {} fields from {}",
            record.populated_fields(),
            Field::ALL.len(),
            url
        );

        if !self.ensure_index().await {
            tracing::warn!("Skipping {}: index is not available", url);
            return skip(state, url, SkipReason::Provision);
        }

        match self.store.put(&self.config.search.index, &record).await {
            StoreOutcome::Stored { id } => {
                let state = step(state, LinkState::Indexed);
                tracing::info!(%state, "Indexed {} as {}", url, id);
                LinkOutcome::Indexed { url, id }
            }
            StoreOutcome::Failed => {
                tracing::warn!("Skipping {}: record could not be stored", url);
                skip(state, url, SkipReason::Store)
            }
        }
    }

    /// Ensures the target index exists, remembering only success
    async fn ensure_index(&self) -> bool {
        let index = self.config.search.index.as_str();
        let result = self
            .provisioned
            .get_or_try_init(|| async {
                let outcome = self.provisioner.ensure(index, &self.schema).await;
                if outcome.is_ready() {
                    Ok(outcome)
                } else {
                    Err(outcome)
                }
            })
            .await;

        result.is_ok()
    }

    fn advance(&mut self, next: RunPhase) {
        if self.phase.can_transition_to(next) {
            tracing::debug!("Run phase {} -> {}", self.phase, next);
            self.phase = next;
        } else {
            tracing::error!("Invalid run phase transition {} -> {}", self.phase, next);
        }
    }
}

/// Moves a link to `next`
///
/// The transition table is fixed, so an invalid move is a coordinator bug.
fn step(state: LinkState, next: LinkState) -> LinkState {
    debug_assert!(
        state.can_transition_to(next),
        "invalid link transition {} -> {}",
        state,
        next
    );
    tracing::trace!("Link state {} -> {}", state, next);
    next
}

/// Ends a link as skipped
fn skip(state: LinkState, url: String, reason: SkipReason) -> LinkOutcome {
    let state = step(state, LinkState::Skipped);
    tracing::debug!(%state, "Link {} ended: {}", url, reason);
    LinkOutcome::Skipped { url, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::storage::MemoryBackend;

    fn test_config() -> Config {
        parse_config(
            r#"
[crawler]
listing-url = "http://127.0.0.1:1/listing"
link-selector = "ul.list a"
request-delay-ms = 100
max-retries = 0

[search]
url = "http://127.0.0.1:1"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_coordinator_creation() {
        let coordinator =
            Coordinator::with_backend(test_config(), Arc::new(MemoryBackend::new())).unwrap();
        assert_eq!(coordinator.phase(), RunPhase::Init);
    }

    #[test]
    fn test_invalid_link_selector_rejected() {
        let mut config = test_config();
        config.crawler.link_selector = "ul[".to_string();

        let expected = scraper::Selector::parse("ul[").unwrap_err().to_string();
        match Coordinator::with_backend(config, Arc::new(MemoryBackend::new())) {
            Err(CrawlError::Config(ConfigError::InvalidSelector { message, .. })) => {
                assert_eq!(message, expected);
            }
            other => panic!("expected invalid selector error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_unhealthy_backend_aborts_run() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_unhealthy(true);

        let mut coordinator = Coordinator::with_backend(test_config(), backend).unwrap();
        let result = coordinator.run().await;

        assert!(matches!(result, Err(CrawlError::Search(_))));
        assert_eq!(coordinator.phase(), RunPhase::Init);
    }

    #[tokio::test]
    async fn test_unreachable_listing_ends_run() {
        let backend = Arc::new(MemoryBackend::new());
        let mut coordinator = Coordinator::with_backend(test_config(), backend.clone()).unwrap();

        let report = coordinator.run().await.unwrap();

        assert!(report.listing_failed);
        assert_eq!(report.links_found, 0);
        assert_eq!(coordinator.phase(), RunPhase::Done);
        assert_eq!(backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_link_is_not_fetched() {
        let coordinator =
            Coordinator::with_backend(test_config(), Arc::new(MemoryBackend::new())).unwrap();
        coordinator.cancellation_token().cancel();

        let target = CrawlTarget::new(Url::parse("http://127.0.0.1:1/doctors/a").unwrap());
        let outcome = coordinator.process_link(&target).await;

        assert_eq!(
            outcome,
            LinkOutcome::Cancelled {
                url: "http://127.0.0.1:1/doctors/a".to_string()
            }
        );
    }

    #[test]
    fn test_step_follows_transition_table() {
        let state = step(LinkState::Fetching, LinkState::Parsed);
        assert_eq!(step(state, LinkState::Indexed), LinkState::Indexed);
    }

    #[test]
    fn test_skip_ends_link() {
        let outcome = skip(
            LinkState::Parsed,
            "https://example.com/doctors/a".to_string(),
            SkipReason::Store,
        );
        assert_eq!(
            outcome,
            LinkOutcome::Skipped {
                url: "https://example.com/doctors/a".to_string(),
                reason: SkipReason::Store
            }
        );
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::Provision.as_str(), "provision");
        assert_eq!(
            SkipReason::Fetch("HTTP 404".to_string()).to_string(),
            "fetch failed: HTTP 404"
        );
    }
}
