//! Physician-Indexer main entry point
//!
//! This is the command-line interface for the physician directory indexer.

use anyhow::Context;
use clap::Parser;
use physician_indexer::config::{load_config_with_hash, Config};
use physician_indexer::crawler::Coordinator;
use physician_indexer::output::{print_buckets, print_report};
use physician_indexer::record::Field;
use physician_indexer::storage::{open_backend, AggregationQuery};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Physician-Indexer: a polite directory scraper feeding Elasticsearch
///
/// Physician-Indexer fetches a listing page, follows every detail link,
/// extracts physician profile fields and stores one document per physician
/// in a search index.
#[derive(Parser, Debug)]
#[command(name = "physician-indexer")]
#[command(version = "1.0.0")]
#[command(about = "Scrapes physician profiles into a search index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "aggregate_only")]
    dry_run: bool,

    /// Run the full_name aggregation against the index and exit
    #[arg(long, conflicts_with = "dry_run")]
    aggregate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.aggregate_only {
        handle_aggregate(&config).await?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("physician_indexer=info,warn"),
            1 => EnvFilter::new("physician_indexer=debug,info"),
            2 => EnvFilter::new("physician_indexer=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Physician-Indexer Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Listing page: {}", config.crawler.listing_url);
    println!("  Link selector: {}", config.crawler.link_selector);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Timeout: {}s", config.crawler.timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nSearch Backend:");
    println!("  URL: {}", config.search.url);
    println!("  Index: {}", config.search.index);
    println!("  Document type: {}", config.search.document_type);
    println!(
        "  Shards / replicas: {} / {}",
        config.search.shards, config.search.replicas
    );
    println!(
        "  Aggregate after run: {} (size {})",
        config.search.aggregate_after_run, config.search.aggregation_size
    );

    println!("\nField Selectors:");
    for field in Field::ALL {
        println!("  {}: {}", field.name(), config.selectors.get(field));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --aggregate-only mode: prints full_name buckets
async fn handle_aggregate(config: &Config) -> anyhow::Result<()> {
    let timeout = Duration::from_secs(config.crawler.timeout_secs);
    let backend = open_backend(&config.search, timeout)?;
    let query = AggregationQuery::new(backend, config.search.aggregation_size);

    let field = Field::FullName.name();
    let buckets = query
        .terms_aggregation(&config.search.index, field)
        .await
        .with_context(|| format!("Aggregation on index {} failed", config.search.index))?;

    print_buckets(field, &buckets);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} into index {} with {} worker(s)",
        config.crawler.listing_url,
        config.search.index,
        config.crawler.workers
    );

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight links");
            interrupt.cancel();
        }
    });

    let mut coordinator = Coordinator::new(config)?.with_cancellation(token);

    match coordinator.run().await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
