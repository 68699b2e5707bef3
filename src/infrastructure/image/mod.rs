//! Handle factories for fetched images.
//!
//! - `blob`: object-URL style handles backed by a revocable registry
//! - `decoded`: eagerly decoded pixel buffers

mod blob_store;
mod decoded;

pub use blob_store::{BlobHandle, BlobStore};
pub use decoded::DecodedImageFactory;
