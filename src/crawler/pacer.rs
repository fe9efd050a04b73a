//! Politeness pacing for outgoing requests
//!
//! All workers share one pacer, so the configured delay separates the start
//! of any two requests to the source site regardless of how many links are
//! processed at once.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between successive requests
#[derive(Debug)]
pub struct RequestPacer {
    /// Minimum time between two request starts
    min_interval: Duration,

    /// When the last request was released
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Waits until the next request may be sent, then records it
    ///
    /// The first request is released immediately. The lock is held across
    /// the sleep so concurrent callers are released one interval apart.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(wait) = time_until_next_request(*last, self.min_interval, Instant::now()) {
            tracing::trace!("Pacing request for {:?}", wait);
            tokio::time::sleep(wait).await;
        }

        *last = Some(Instant::now());
    }
}

/// Calculates the time until the next request can be made
///
/// Returns None if a request can be made now, or the duration to wait otherwise.
fn time_until_next_request(
    last: Option<Instant>,
    min_interval: Duration,
    now: Instant,
) -> Option<Duration> {
    let last = last?;
    let elapsed = now.duration_since(last);
    if elapsed < min_interval {
        Some(min_interval - elapsed)
    } else {
        None
    }
}
