//! Port for turning bytes into displayable handles and releasing them.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::CacheKey;
use crate::domain::errors::HandleError;

/// Converts fetched bytes into a renderable handle and releases it later.
///
/// The cache calls [`HandlePort::release`] exactly once for every handle it
/// evicts and never for a handle still held by a live entry.
#[async_trait]
pub trait HandlePort: Send + Sync {
    /// Handle type handed to renderers.
    type Handle: Clone + Send + Sync + 'static;

    /// Builds a handle for the bytes fetched for `key`.
    async fn create(&self, key: &CacheKey, bytes: Bytes) -> Result<Self::Handle, HandleError>;

    /// Frees whatever external resource backs `handle`.
    fn release(&self, handle: &Self::Handle);
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Handle produced by [`CountingHandles`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TestHandle {
        /// Monotonic serial, unique per `create`.
        pub serial: u64,
        /// Wrapped payload.
        pub bytes: Bytes,
    }

    /// Handle factory that records every release.
    pub struct CountingHandles {
        next: AtomicU64,
        released: Mutex<Vec<TestHandle>>,
        reject: Option<HandleError>,
        panic_on_release: bool,
    }

    impl CountingHandles {
        /// Creates a factory accepting any payload.
        pub fn new() -> Self {
            Self {
                next: AtomicU64::new(1),
                released: Mutex::new(Vec::new()),
                reject: None,
                panic_on_release: false,
            }
        }

        /// Creates a factory that fails every `create`.
        pub fn rejecting(err: HandleError) -> Self {
            Self {
                reject: Some(err),
                ..Self::new()
            }
        }

        /// Creates a factory whose `release` records the handle, then panics.
        pub fn panicking_release() -> Self {
            Self {
                panic_on_release: true,
                ..Self::new()
            }
        }

        /// Handles released so far, in release order.
        pub fn released(&self) -> Vec<TestHandle> {
            self.released.lock().clone()
        }
    }

    impl Default for CountingHandles {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl HandlePort for CountingHandles {
        type Handle = TestHandle;

        async fn create(&self, _key: &CacheKey, bytes: Bytes) -> Result<TestHandle, HandleError> {
            if let Some(err) = &self.reject {
                return Err(err.clone());
            }
            Ok(TestHandle {
                serial: self.next.fetch_add(1, Ordering::SeqCst),
                bytes,
            })
        }

        fn release(&self, handle: &TestHandle) {
            self.released.lock().push(handle.clone());
            assert!(!self.panic_on_release, "release of handle #{} failed", handle.serial);
        }
    }
}
