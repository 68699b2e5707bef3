//! Port for canonicalizing raw image references.

use crate::domain::entities::NormalizedUrl;

/// Maps a possibly relative reference onto its canonical cache key.
///
/// Must be pure and idempotent: normalizing a key's own string yields the
/// same key.
pub trait UrlNormalizerPort: Send + Sync {
    /// Normalizes and classifies `raw`.
    fn normalize(&self, raw: &str) -> NormalizedUrl;
}
