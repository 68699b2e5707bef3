//! Object-URL style registry of in-memory image blobs.
//!
//! Each handle owns a `blob:` URL registered here until it is released,
//! mirroring how a renderer resolves object URLs to bytes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::application::use_cases::DescribeHandle;
use crate::domain::entities::CacheKey;
use crate::domain::errors::HandleError;
use crate::domain::ports::HandlePort;

const BLOB_SCHEME_PREFIX: &str = "blob:cinevault/";

struct Blob {
    url: String,
    mime: &'static str,
    bytes: Bytes,
}

/// Displayable reference to fetched image bytes.
#[derive(Clone)]
pub struct BlobHandle(Arc<Blob>);

impl BlobHandle {
    /// Returns the `blob:` URL renderers use.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.0.url
    }

    /// Returns the sniffed MIME type.
    #[must_use]
    pub fn mime(&self) -> &'static str {
        self.0.mime
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.0.bytes
    }

    /// Returns the payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.bytes.len()
    }

    /// Returns true for an empty payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.bytes.is_empty()
    }
}

impl PartialEq for BlobHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.url == other.0.url
    }
}

impl Eq for BlobHandle {}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("url", &self.0.url)
            .field("mime", &self.0.mime)
            .field("len", &self.0.bytes.len())
            .finish()
    }
}

impl DescribeHandle for BlobHandle {
    fn describe(&self) -> String {
        format!("{} ({}, {} bytes)", self.url(), self.mime(), self.len())
    }
}

/// Mints blob handles and revokes them on release.
#[derive(Default)]
pub struct BlobStore {
    live: RwLock<HashMap<String, Bytes>>,
}

impl BlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the bytes behind a live `blob:` URL.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.live.read().get(url).cloned()
    }

    /// Returns the number of blob URLs not yet revoked.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.read().len()
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("live", &self.live_count())
            .finish()
    }
}

#[async_trait]
impl HandlePort for BlobStore {
    type Handle = BlobHandle;

    async fn create(&self, key: &CacheKey, bytes: Bytes) -> Result<BlobHandle, HandleError> {
        let format = image::guess_format(&bytes)
            .map_err(|e| HandleError::Unsupported(format!("{key}: {e}")))?;

        let url = format!("{BLOB_SCHEME_PREFIX}{}", Uuid::new_v4());
        self.live.write().insert(url.clone(), bytes.clone());
        trace!(key = %key, blob = %url, "Registered image blob");

        Ok(BlobHandle(Arc::new(Blob {
            url,
            mime: format.to_mime_type(),
            bytes,
        })))
    }

    fn release(&self, handle: &BlobHandle) {
        if self.live.write().remove(handle.url()).is_some() {
            trace!(blob = %handle.url(), "Revoked image blob");
        } else {
            warn!(blob = %handle.url(), "Released a blob that was not live");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn key() -> CacheKey {
        CacheKey::new("http://host/img/a")
    }

    #[tokio::test]
    async fn test_create_registers_blob() -> Result<(), Box<dyn std::error::Error>> {
        let store = BlobStore::new();
        let handle = store.create(&key(), Bytes::from_static(PNG_MAGIC)).await?;

        assert!(handle.url().starts_with(BLOB_SCHEME_PREFIX));
        assert_eq!(handle.mime(), "image/png");
        assert_eq!(handle.len(), PNG_MAGIC.len());
        assert_eq!(store.resolve(handle.url()), Some(Bytes::from_static(PNG_MAGIC)));
        assert_eq!(store.live_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_release_revokes_blob() -> Result<(), Box<dyn std::error::Error>> {
        let store = BlobStore::new();
        let handle = store.create(&key(), Bytes::from_static(PNG_MAGIC)).await?;

        store.release(&handle);
        assert_eq!(store.resolve(handle.url()), None);
        assert_eq!(store.live_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_each_create_gets_fresh_url() -> Result<(), Box<dyn std::error::Error>> {
        let store = BlobStore::new();
        let first = store.create(&key(), Bytes::from_static(PNG_MAGIC)).await?;
        let second = store.create(&key(), Bytes::from_static(PNG_MAGIC)).await?;

        assert_ne!(first, second);
        assert_eq!(first.clone(), first);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_image_rejected() {
        let store = BlobStore::new();
        let result = store
            .create(&key(), Bytes::from_static(b"<!doctype html><html></html>"))
            .await;

        assert!(matches!(result, Err(HandleError::Unsupported(_))));
        assert_eq!(store.live_count(), 0);
    }
}
