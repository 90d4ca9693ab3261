use std::fmt;

/// Why the pagination loop stopped
///
/// Every reason leads to finalization with whatever was collected; none of
/// them is a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The controller requested cancellation
    Cancelled,

    /// A listing page contained no article links (end of category)
    PageEmpty,

    /// The page cursor passed the requested end page
    BoundReached,

    /// Too many pages in a row yielded no new article
    NoNewArticles,

    /// Too many listing requests in a row failed
    TooManyFailures,
}

impl StopReason {
    /// Returns true if the loop ended on its own rather than being interrupted
    pub fn is_natural_end(&self) -> bool {
        matches!(self, Self::PageEmpty | Self::BoundReached | Self::NoNewArticles)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::PageEmpty => "page_empty",
            Self::BoundReached => "bound_reached",
            Self::NoNewArticles => "no_new_articles",
            Self::TooManyFailures => "too_many_failures",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
