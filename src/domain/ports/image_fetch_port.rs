//! Port for authenticated image retrieval.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::CacheKey;
use crate::domain::errors::FetchError;

/// Retrieves raw image bytes for a canonical URL.
///
/// Implementations attach whatever credential the session holds. The cache
/// treats this as a black box: no retries, no credential refresh.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches the resource behind `key`.
    async fn fetch(&self, key: &CacheKey) -> Result<Bytes, FetchError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use tokio::sync::Semaphore;

    /// Scripted fetcher that counts calls and tracks peak parallelism.
    ///
    /// When gated, every fetch parks until [`ScriptedFetcher::release`] hands
    /// out a permit, letting tests hold requests in flight.
    pub struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Result<Bytes, FetchError>>>,
        calls: Mutex<Vec<String>>,
        active: AtomicUsize,
        peak: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedFetcher {
        /// Creates a fetcher that answers immediately.
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Creates a fetcher whose calls wait for [`Self::release`].
        pub fn gated() -> Self {
            Self {
                gate: Some(Arc::new(Semaphore::new(0))),
                ..Self::new()
            }
        }

        /// Scripts the response for a canonical URL. Unscripted URLs get 404.
        pub fn respond(&self, url: &str, response: Result<Bytes, FetchError>) {
            self.responses.lock().insert(url.to_string(), response);
        }

        /// Lets `n` parked fetches complete.
        pub fn release(&self, n: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(n);
            }
        }

        /// Total number of fetch calls.
        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        /// URLs fetched, in start order.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        /// Number of fetches currently running.
        pub fn active(&self) -> usize {
            self.active.load(Ordering::SeqCst)
        }

        /// Highest number of simultaneously running fetches observed.
        pub fn peak(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    impl Default for ScriptedFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ImageFetchPort for ScriptedFetcher {
        async fn fetch(&self, key: &CacheKey) -> Result<Bytes, FetchError> {
            self.calls.lock().push(key.as_str().to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.responses
                .lock()
                .get(key.as_str())
                .cloned()
                .unwrap_or(Err(FetchError::status(404)))
        }
    }
}
