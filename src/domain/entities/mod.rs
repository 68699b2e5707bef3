//! Domain entity definitions.

mod cache_entry;
mod cache_key;
mod token;

pub use cache_entry::CacheEntry;
pub use cache_key::{CacheKey, NormalizedUrl, UrlKind, movie_poster_path};
pub use token::AuthToken;
