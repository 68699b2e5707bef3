//! Catalog URL normalization and classification.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use url::Url;

use crate::domain::entities::{CacheKey, NormalizedUrl, UrlKind};
use crate::domain::ports::UrlNormalizerPort;

/// Default catalog backend origin.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Default image base of the metadata provider.
pub const DEFAULT_CATALOG_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

/// Bare provider image paths look like `/kqjL17yufvn9OVLyXYpvtyrFfak.jpg`.
static CATALOG_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/?[A-Za-z0-9_-]+\.(?:jpe?g|png|webp)$").expect("Invalid regex")
});

/// Resolves raw references against the catalog backend and the metadata
/// provider's image host.
#[derive(Debug, Clone)]
pub struct CatalogUrlNormalizer {
    api_base: Url,
    catalog_image_base: String,
}

impl CatalogUrlNormalizer {
    /// Creates a normalizer for the given bases.
    ///
    /// # Errors
    /// Returns error if `api_base` is not an absolute URL.
    pub fn new(api_base: &str, catalog_image_base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            api_base: Url::parse(api_base)?,
            catalog_image_base: catalog_image_base.trim_end_matches('/').to_string(),
        })
    }

    fn is_absolute(raw: &str) -> bool {
        let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
        lower.starts_with("http://")
            || lower.starts_with("https://")
            || lower.starts_with("blob:")
            || lower.starts_with("data:")
    }

    fn same_origin(&self, raw: &str) -> bool {
        Url::parse(raw).is_ok_and(|url| url.origin() == self.api_base.origin())
    }

    fn classify(&self, raw: &str) -> UrlKind {
        if Self::is_absolute(raw) {
            if self.same_origin(raw) {
                UrlKind::LocalUpload
            } else {
                UrlKind::External
            }
        } else if CATALOG_PATH_RE.is_match(raw) {
            UrlKind::RemoteCatalogPath
        } else {
            UrlKind::LocalUpload
        }
    }

    fn resolve_backend(&self, raw: &str) -> String {
        self.api_base.join(raw).map_or_else(
            |_| {
                format!(
                    "{}/{}",
                    self.api_base.as_str().trim_end_matches('/'),
                    raw.trim_start_matches('/')
                )
            },
            String::from,
        )
    }
}

impl Default for CatalogUrlNormalizer {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default api base is a valid URL"),
            catalog_image_base: DEFAULT_CATALOG_IMAGE_BASE.to_string(),
        }
    }
}

impl UrlNormalizerPort for CatalogUrlNormalizer {
    fn normalize(&self, raw: &str) -> NormalizedUrl {
        let raw = raw.trim();
        let kind = self.classify(raw);

        let canonical = if Self::is_absolute(raw) {
            raw.to_string()
        } else {
            match kind {
                UrlKind::RemoteCatalogPath => format!(
                    "{}/{}",
                    self.catalog_image_base,
                    raw.trim_start_matches('/')
                ),
                UrlKind::LocalUpload | UrlKind::External => self.resolve_backend(raw),
            }
        };

        trace!(raw = raw, key = %canonical, kind = %kind, "Normalized image reference");

        NormalizedUrl {
            key: CacheKey::new(canonical),
            kind,
        }
    }
}
