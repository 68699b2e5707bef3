//! Handle factory that decodes images up front.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use tracing::debug;

use crate::application::use_cases::DescribeHandle;
use crate::domain::entities::CacheKey;
use crate::domain::errors::HandleError;
use crate::domain::ports::HandlePort;

impl DescribeHandle for Arc<DynamicImage> {
    fn describe(&self) -> String {
        format!("{}x{} {:?}", self.width(), self.height(), self.color())
    }
}

/// Decodes fetched bytes into shared pixel buffers.
///
/// Decoding runs on the blocking pool. Releasing drops the cache's reference;
/// renderers holding a clone keep the pixels alive until they drop it.
#[derive(Debug, Default)]
pub struct DecodedImageFactory {
    live: AtomicUsize,
}

impl DecodedImageFactory {
    /// Creates a factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of decoded images not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HandlePort for DecodedImageFactory {
    type Handle = Arc<DynamicImage>;

    async fn create(&self, key: &CacheKey, bytes: Bytes) -> Result<Arc<DynamicImage>, HandleError> {
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| HandleError::Decode(format!("decode task panicked: {e}")))?
            .map_err(|e| match e {
                image::ImageError::Unsupported(_) => HandleError::Unsupported(e.to_string()),
                other => HandleError::Decode(other.to_string()),
            })?;

        debug!(
            key = %key,
            width = decoded.width(),
            height = decoded.height(),
            "Decoded image"
        );
        self.live.fetch_add(1, Ordering::Relaxed);

        Ok(Arc::new(decoded))
    }

    fn release(&self, _handle: &Arc<DynamicImage>) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let img = DynamicImage::new_rgb8(3, 2);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        Bytes::from(out.into_inner())
    }

    #[tokio::test]
    async fn test_decode_png() -> Result<(), Box<dyn std::error::Error>> {
        let factory = DecodedImageFactory::new();
        let key = CacheKey::new("http://host/img/a");

        let image = factory.create(&key, png_bytes()).await?;
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(factory.live_count(), 1);

        factory.release(&image);
        assert_eq!(factory.live_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_garbage_fails() {
        let factory = DecodedImageFactory::new();
        let key = CacheKey::new("http://host/img/a");

        let result = factory.create(&key, Bytes::from_static(b"not an image")).await;
        assert!(result.is_err());
        assert_eq!(factory.live_count(), 0);
    }
}
