//! Application layer with the image cache service and use cases.

/// Data transfer objects.
pub mod dto;
/// Stateful services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{LoadReport, LoadStatus};
pub use services::{CacheStats, ImageFetchCache, LoadOutcome};
pub use use_cases::{DescribeHandle, LoadImagesUseCase};
