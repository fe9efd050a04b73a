/// Link state definitions for tracking per-link progress
///
/// Each detail-page link moves through `Fetching → Parsed → Indexed`, or
/// ends in `Skipped` from any non-terminal state.
use std::fmt;

/// Represents the current state of one detail-page link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    // ===== Active States =====
    /// Detail page request is in flight
    Fetching,

    /// Detail page was fetched and turned into a record
    Parsed,

    // ===== Terminal States =====
    /// Record was stored in the index
    Indexed,

    /// Link was abandoned (fetch, provisioning or store failure, or cancellation)
    Skipped,
}

impl LinkState {
    /// Checks whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: LinkState) -> bool {
        matches!(
            (self, next),
            (Self::Fetching, Self::Parsed)
                | (Self::Fetching, Self::Skipped)
                | (Self::Parsed, Self::Indexed)
                | (Self::Parsed, Self::Skipped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Parsed => "parsed",
            Self::Indexed => "indexed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
