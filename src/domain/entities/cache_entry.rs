//! Terminal cache states for one key.

/// Settled outcome stored for a cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry<H> {
    /// Fetched bytes turned into a displayable handle.
    Resolved(H),
    /// Fetch completed without a usable image; suppresses retries.
    Absent,
}

impl<H: Clone> CacheEntry<H> {
    /// Returns the handle a `load` hit yields.
    #[must_use]
    pub fn handle(&self) -> Option<H> {
        match self {
            Self::Resolved(handle) => Some(handle.clone()),
            Self::Absent => None,
        }
    }
}

impl<H> CacheEntry<H> {
    /// Returns true if this entry owns a handle.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns true for the negative-cache sentinel.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Consumes the entry, yielding the owned handle if any.
    #[must_use]
    pub fn into_handle(self) -> Option<H> {
        match self {
            Self::Resolved(handle) => Some(handle),
            Self::Absent => None,
        }
    }
}
