//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunPhase`: phase of the whole run (init, listing fetched, done)
//! - `LinkState`: state of one detail-page link (fetching, parsed, indexed, skipped)

mod link_state;
mod run_phase;

// Re-export main types
pub use link_state::LinkState;
pub use run_phase::RunPhase;
