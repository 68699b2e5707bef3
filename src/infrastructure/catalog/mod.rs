//! Catalog backend adapters: authenticated image fetching and URL resolution.

mod client;
mod urls;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpImageFetcher};
pub use urls::{CatalogUrlNormalizer, DEFAULT_API_BASE, DEFAULT_CATALOG_IMAGE_BASE};
