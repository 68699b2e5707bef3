//! Cache key and URL classification value objects.

use std::fmt;

/// Canonical absolute URL identifying one cacheable image.
///
/// Keys are only minted by a [`UrlNormalizerPort`](crate::domain::ports::UrlNormalizerPort),
/// so two inputs that normalize to the same URL always share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already canonical URL.
    #[must_use]
    pub fn new(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    /// Returns the canonical URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Backend path serving a movie's poster (custom upload or mirrored artwork).
#[must_use]
pub fn movie_poster_path(id: impl fmt::Display) -> String {
    format!("/api/v1/movies/{id}/poster")
}

/// Where a raw image reference points before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// Absolute `http(s)` URL, used unchanged.
    External,
    /// Path served by the catalog backend (API routes, user uploads).
    LocalUpload,
    /// Bare image path handed out by the metadata provider.
    RemoteCatalogPath,
}

impl fmt::Display for UrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => write!(f, "external"),
            Self::LocalUpload => write!(f, "local"),
            Self::RemoteCatalogPath => write!(f, "catalog"),
        }
    }
}

/// Result of normalizing a raw reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// Canonical cache key.
    pub key: CacheKey,
    /// Classification decided during normalization.
    pub kind: UrlKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_equality_is_exact() {
        assert_eq!(
            CacheKey::new("http://host/api/v1/x"),
            CacheKey::new("http://host/api/v1/x")
        );
        assert_ne!(
            CacheKey::new("http://host/api/v1/x"),
            CacheKey::new("http://host/api/v1/x/")
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(UrlKind::External.to_string(), "external");
        assert_eq!(UrlKind::RemoteCatalogPath.to_string(), "catalog");
        assert_eq!(UrlKind::LocalUpload.to_string(), "local");
    }
}
