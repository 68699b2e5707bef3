//! Domain layer with core entities, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{AuthToken, CacheEntry, CacheKey, UrlKind};
pub use errors::{FetchError, HandleError, LoadError};
pub use ports::{HandlePort, ImageFetchPort, UrlNormalizerPort};
