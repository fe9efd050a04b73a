use std::fmt;

/// Phase of a whole crawl run
///
/// `Init → ListingFetched → Done`, or `Init → Done` when the listing page
/// could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Init,
    ListingFetched,
    Done,
}

impl RunPhase {
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::ListingFetched)
                | (Self::Init, Self::Done)
                | (Self::ListingFetched, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ListingFetched => "listing_fetched",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
