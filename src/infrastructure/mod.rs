//! Infrastructure layer with external service adapters.

/// Catalog backend HTTP and URL adapters.
pub mod catalog;
/// Application configuration.
pub mod config;
/// Image handle factories.
pub mod image;

pub use catalog::{CatalogUrlNormalizer, HttpImageFetcher};
pub use config::{AppConfig, CliArgs, HandleKind, LogLevel, StorageManager};
pub use self::image::{BlobHandle, BlobStore, DecodedImageFactory};
