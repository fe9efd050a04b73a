//! Crawl run report
//!
//! Collects per-link outcomes during a run and prints the summary shown at
//! the end of the CLI run.

use crate::crawler::{LinkOutcome, SkipReason};
use crate::storage::{ProvisionOutcome, TermBucket};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A link that did not end up in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    pub url: String,
    pub reason: SkipReason,
}

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The listing page the run started from
    pub listing_url: String,

    /// Target index
    pub index: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// True if the listing page could not be fetched
    pub listing_failed: bool,
    pub listing_error: Option<String>,

    /// Number of detail links extracted from the listing page
    pub links_found: usize,

    /// Number of records stored
    pub indexed: usize,

    /// Links abandoned after a fetch, provisioning or store failure
    pub skipped: Vec<SkippedLink>,

    /// Links never started because the run was cancelled
    pub cancelled: usize,

    /// How the index was provisioned, if any record reached that step
    pub provision: Option<ProvisionOutcome>,

    /// Post-run `full_name` aggregation buckets
    pub aggregation: Option<Vec<TermBucket>>,
}

impl CrawlReport {
    pub fn new(listing_url: &str, index: &str) -> Self {
        Self {
            listing_url: listing_url.to_string(),
            index: index.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            listing_failed: false,
            listing_error: None,
            links_found: 0,
            indexed: 0,
            skipped: Vec::new(),
            cancelled: 0,
            provision: None,
            aggregation: None,
        }
    }

    /// Marks the listing page as unreachable
    pub fn mark_listing_failed(&mut self, error: String) {
        self.listing_failed = true;
        self.listing_error = Some(error);
    }

    /// Counts the outcome of one link
    pub fn record(&mut self, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Indexed { .. } => self.indexed += 1,
            LinkOutcome::Skipped { url, reason } => self.skipped.push(SkippedLink {
                url: url.clone(),
                reason: reason.clone(),
            }),
            LinkOutcome::Cancelled { .. } => self.cancelled += 1,
        }
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Skipped links counted per failing step
    pub fn skips_by_reason(&self) -> HashMap<&'static str, usize> {
        let mut counts = HashMap::new();
        for skipped in &self.skipped {
            *counts.entry(skipped.reason.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Listing page: {}", report.listing_url);
    println!("  Index: {}", report.index);
    println!(
        "  Started: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    if let Some(provision) = report.provision {
        println!("  Index provisioning: {}", provision);
    }
    println!();

    if report.listing_failed {
        println!(
            "Listing page could not be fetched: {}",
            report.listing_error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    println!("Links:");
    println!("  Found: {}", report.links_found);
    println!("  Indexed: {}", report.indexed);
    println!("  Skipped: {}", report.skipped_count());
    if report.cancelled > 0 {
        println!("  Cancelled: {}", report.cancelled);
    }
    println!();

    if !report.skipped.is_empty() {
        println!("Skip Summary:");
        let mut reason_counts: Vec<_> = report.skips_by_reason().into_iter().collect();
        reason_counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        for (reason, count) in reason_counts {
            println!("  {}: {}", reason, count);
        }
        for skipped in &report.skipped {
            println!("  - {} ({})", skipped.url, skipped.reason);
        }
        println!();
    }

    if let Some(buckets) = &report.aggregation {
        print_buckets("full_name", buckets);
        println!();
    }

    let success_rate = if report.links_found > 0 {
        (report.indexed as f64 / report.links_found as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} links indexed)",
        success_rate, report.indexed, report.links_found
    );
}

/// Prints term aggregation buckets, one per line
pub fn print_buckets(field: &str, buckets: &[TermBucket]) {
    println!("Top values of {} ({}):", field, buckets.len());
    for bucket in buckets {
        println!("  {}: {}", bucket.key, bucket.doc_count);
    }
}
