pub mod image_fetch_cache;

pub use image_fetch_cache::{
    CacheStats, DEFAULT_MAX_CONCURRENT_FETCHES, ImageFetchCache, LoadOutcome,
};
