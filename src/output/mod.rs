//! Output module for crawl reports
//!
//! This module handles:
//! - Collecting per-link outcomes into a run report
//! - Printing the report and aggregation buckets for the CLI

mod report;

pub use report::{print_buckets, print_report, CrawlReport, SkippedLink};
