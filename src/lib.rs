//! Cinevault - authenticated poster and artwork loading for the movie catalog.
//!
//! The core is [`application::ImageFetchCache`]: a session-wide cache of image
//! handles keyed by normalized URL that deduplicates in-flight fetches, bounds
//! how many run at once, and releases handles on invalidation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the cache service and use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "cinevault";
