//! Deduplicating image fetch cache with a bounded fetch queue.
//!
//! Every key moves through `NoEntry -> Pending(queued) -> Pending(active) ->
//! Resolved | Absent`, and back to `NoEntry` on invalidation. At most one
//! fetch per key is ever in flight; every caller that asked for the key while
//! it was pending observes the same outcome.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{CacheEntry, CacheKey, NormalizedUrl, movie_poster_path};
use crate::domain::errors::LoadError;
use crate::domain::ports::{HandlePort, ImageFetchPort, UrlNormalizerPort};

/// Default number of simultaneously running fetches.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// What a `load` resolves to: a handle, `None` for a miss, or a hard failure.
pub type LoadOutcome<H> = Result<Option<H>, LoadError>;

/// Single-assignment channel shared by everyone waiting on one key.
type Waiters<H> = watch::Sender<Option<LoadOutcome<H>>>;

struct CacheState<H> {
    entries: HashMap<CacheKey, CacheEntry<H>>,
    pending: HashMap<CacheKey, Waiters<H>>,
    queue: VecDeque<CacheKey>,
    active: usize,
    hits: u64,
    misses: u64,
    fetches: u64,
}

impl<H> Default for CacheState<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            pending: HashMap::new(),
            queue: VecDeque::new(),
            active: 0,
            hits: 0,
            misses: 0,
            fetches: 0,
        }
    }
}

struct Inner<H> {
    fetcher: Arc<dyn ImageFetchPort>,
    handles: Arc<dyn HandlePort<Handle = H>>,
    normalizer: Arc<dyn UrlNormalizerPort>,
    max_concurrent: NonZeroUsize,
    state: Mutex<CacheState<H>>,
}

/// Session-wide cache of image handles keyed by normalized URL.
///
/// Cloning yields another handle onto the same cache. Build one instance at
/// the composition root and share it.
pub struct ImageFetchCache<H> {
    inner: Arc<Inner<H>>,
}

impl<H> Clone for ImageFetchCache<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> std::fmt::Debug for ImageFetchCache<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFetchCache")
            .field("max_concurrent", &self.inner.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl<H> ImageFetchCache<H>
where
    H: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache over the given collaborators.
    pub fn new(
        fetcher: Arc<dyn ImageFetchPort>,
        handles: Arc<dyn HandlePort<Handle = H>>,
        normalizer: Arc<dyn UrlNormalizerPort>,
        max_concurrent: NonZeroUsize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                handles,
                normalizer,
                max_concurrent,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Returns the concurrency ceiling.
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent.get()
    }

    /// Normalizes a raw reference the same way `load` does.
    #[must_use]
    pub fn normalize(&self, raw_url: &str) -> NormalizedUrl {
        self.inner.normalizer.normalize(raw_url)
    }

    /// Loads the image behind `raw_url`.
    ///
    /// Returns immediately on a cache hit. Otherwise joins the in-flight
    /// request for the key, or queues a new one, and waits for it to settle.
    ///
    /// # Errors
    /// Returns the failure of the fetch this call waited on when it failed
    /// hard (transport, decode). The key is then cached as absent, so later
    /// calls resolve to `Ok(None)` until invalidated.
    pub async fn load(&self, raw_url: &str) -> LoadOutcome<H> {
        let NormalizedUrl { key, kind } = self.normalize(raw_url);

        let (mut rx, enqueued) = {
            let mut state = self.inner.state.lock();

            if let Some(handle) = state.entries.get(&key).map(CacheEntry::handle) {
                state.hits += 1;
                trace!(key = %key, resolved = handle.is_some(), "Image cache hit");
                return Ok(handle);
            }
            state.misses += 1;

            if let Some(waiters) = state.pending.get(&key) {
                trace!(key = %key, "Joining in-flight image request");
                (waiters.subscribe(), false)
            } else {
                let (tx, rx) = watch::channel(None);
                state.pending.insert(key.clone(), tx);
                state.queue.push_back(key.clone());
                debug!(key = %key, kind = %kind, queued = state.queue.len(), "Queued image fetch");
                (rx, true)
            }
        };

        if enqueued {
            self.inner.pump();
        }

        match rx.wait_for(Option::is_some).await {
            Ok(settled) => settled
                .clone()
                .unwrap_or_else(|| Err(LoadError::Interrupted(key.to_string()))),
            Err(_) => Err(LoadError::Interrupted(key.to_string())),
        }
    }

    /// Loads the poster of a catalog movie.
    ///
    /// # Errors
    /// Same as [`ImageFetchCache::load`].
    pub async fn load_poster(&self, movie_id: impl std::fmt::Display) -> LoadOutcome<H> {
        self.load(&movie_poster_path(movie_id)).await
    }

    /// Installs bytes obtained outside the fetch pipeline, e.g. a poster the
    /// user just uploaded.
    ///
    /// Replaces any existing entry and releases its handle. Waiters still
    /// queued for the key are answered from this entry without a fetch, and
    /// a fetch already running for the key does not overwrite it.
    ///
    /// # Errors
    /// Returns error if the bytes cannot become a handle; the cache is left
    /// untouched in that case.
    pub async fn prime(&self, raw_url: &str, bytes: Bytes) -> Result<H, LoadError> {
        let key = self.normalize(raw_url).key;
        let handle = self.inner.handles.create(&key, bytes).await?;

        let displaced = self
            .inner
            .state
            .lock()
            .entries
            .insert(key.clone(), CacheEntry::Resolved(handle.clone()));

        if let Some(old) = displaced.and_then(CacheEntry::into_handle) {
            self.inner.release(&old);
        }
        debug!(key = %key, "Primed image cache");

        Ok(handle)
    }

    /// Drops the entry for `raw_url`, releasing its handle.
    ///
    /// In-flight fetches for the key are unaffected and repopulate the cache
    /// when they settle. Returns false if nothing was cached.
    pub fn invalidate(&self, raw_url: &str) -> bool {
        let key = self.normalize(raw_url).key;
        let removed = self.inner.state.lock().entries.remove(&key);

        let Some(entry) = removed else {
            trace!(key = %key, "Nothing cached to invalidate");
            return false;
        };

        if let Some(handle) = entry.into_handle() {
            self.inner.release(&handle);
        }
        debug!(key = %key, "Invalidated cached image");
        true
    }

    /// Drops the cached poster of a catalog movie.
    pub fn invalidate_movie_poster(&self, movie_id: impl std::fmt::Display) -> bool {
        self.invalidate(&movie_poster_path(movie_id))
    }

    /// Clears every entry, releasing each resolved handle once.
    ///
    /// Returns the number of handles released. Queued and in-flight fetches
    /// keep running.
    pub fn invalidate_all(&self) -> usize {
        let drained: Vec<CacheEntry<H>> = {
            let mut state = self.inner.state.lock();
            state.entries.drain().map(|(_, entry)| entry).collect()
        };

        let total = drained.len();
        let mut released = 0;
        for handle in drained.into_iter().filter_map(CacheEntry::into_handle) {
            self.inner.release(&handle);
            released += 1;
        }

        info!(entries = total, released, "Cleared image cache");
        released
    }

    /// Returns the cached entry for `raw_url` without touching the network.
    #[must_use]
    pub fn peek(&self, raw_url: &str) -> Option<CacheEntry<H>> {
        let key = self.normalize(raw_url).key;
        self.inner.state.lock().entries.get(&key).cloned()
    }

    /// Returns true while a fetch for `raw_url` is queued or running.
    #[must_use]
    pub fn is_pending(&self, raw_url: &str) -> bool {
        let key = self.normalize(raw_url).key;
        self.inner.state.lock().pending.contains_key(&key)
    }

    /// Returns a snapshot of cache and queue counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        let resolved = state.entries.values().filter(|e| e.is_resolved()).count();
        CacheStats {
            resolved,
            absent: state.entries.len() - resolved,
            pending: state.pending.len(),
            queued: state.queue.len(),
            active: state.active,
            hits: state.hits,
            misses: state.misses,
            fetches: state.fetches,
        }
    }
}

impl<H> Inner<H>
where
    H: Clone + Send + Sync + 'static,
{
    /// Starts queued jobs until the ceiling is reached or the queue drains.
    fn pump(self: &Arc<Self>) {
        loop {
            let key = {
                let mut state = self.state.lock();
                if state.active >= self.max_concurrent.get() {
                    return;
                }
                let Some(key) = state.queue.pop_front() else {
                    return;
                };

                if let Some(handle) = state.entries.get(&key).map(CacheEntry::handle) {
                    if let Some(waiters) = state.pending.remove(&key) {
                        waiters.send_replace(Some(Ok(handle)));
                    }
                    debug!(key = %key, "Queued image already cached, skipping fetch");
                    continue;
                }

                state.active += 1;
                state.fetches += 1;
                key
            };

            let inner = Arc::clone(self);
            tokio::spawn(async move {
                inner.run_job(key).await;
            });
        }
    }

    async fn run_job(self: Arc<Self>, key: CacheKey) {
        trace!(key = %key, "Starting image fetch");

        let (entry, outcome) = match AssertUnwindSafe(self.fetch_entry(&key))
            .catch_unwind()
            .await
        {
            Ok(settled) => settled,
            Err(_) => {
                warn!(key = %key, "Image fetch panicked");
                (
                    CacheEntry::Absent,
                    Err(LoadError::Interrupted(format!("fetch for {key} panicked"))),
                )
            }
        };

        let discarded = self.settle(key, entry, outcome);
        self.pump();

        if let Some(handle) = discarded {
            self.release(&handle);
        }
    }

    async fn fetch_entry(&self, key: &CacheKey) -> (CacheEntry<H>, LoadOutcome<H>) {
        let bytes = match self.fetcher.fetch(key).await {
            Ok(bytes) => bytes,
            Err(err) if err.is_soft_miss() => {
                debug!(key = %key, error = %err, "Image unavailable, caching miss");
                return (CacheEntry::Absent, Ok(None));
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Image fetch failed, caching miss");
                return (CacheEntry::Absent, Err(LoadError::Network(err.to_string())));
            }
        };

        match self.handles.create(key, bytes).await {
            Ok(handle) => {
                debug!(key = %key, "Image loaded");
                (CacheEntry::Resolved(handle.clone()), Ok(Some(handle)))
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Fetched image unusable, caching miss");
                (CacheEntry::Absent, Err(err.into()))
            }
        }
    }

    /// Records the terminal entry, wakes every waiter, frees the slot.
    ///
    /// An entry present at this point was primed after the job started and
    /// wins over the fetched one. The losing handle is returned for release.
    fn settle(
        &self,
        key: CacheKey,
        entry: CacheEntry<H>,
        outcome: LoadOutcome<H>,
    ) -> Option<H> {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);

        let primed = state.entries.get(&key).map(CacheEntry::handle);
        let (outcome, discarded) = if let Some(primed) = primed {
            debug!(key = %key, "Image primed during fetch, keeping primed entry");
            (Ok(primed), entry.into_handle())
        } else {
            state.entries.insert(key.clone(), entry);
            (outcome, None)
        };

        if let Some(waiters) = state.pending.remove(&key) {
            waiters.send_replace(Some(outcome));
        }
        discarded
    }

    /// Hands `handle` back to the factory; a panicking adapter is logged.
    fn release(&self, handle: &H) {
        let released =
            std::panic::catch_unwind(AssertUnwindSafe(|| self.handles.release(handle)));
        if released.is_err() {
            warn!("Releasing an image handle panicked");
        }
    }
}

/// Snapshot of cache and queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Entries holding a handle.
    pub resolved: usize,
    /// Negative-cache entries.
    pub absent: usize,
    /// Keys with a queued or running fetch.
    pub pending: usize,
    /// Jobs waiting for a fetch slot.
    pub queued: usize,
    /// Fetches currently running.
    pub active: usize,
    /// Loads answered from an entry.
    pub hits: u64,
    /// Loads that had to wait on a fetch.
    pub misses: u64,
    /// Fetches started.
    pub fetches: u64,
}

impl CacheStats {
    /// Hit rate as a percentage.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images, {} misses cached, {:.1}% hit rate ({} fetches, {} pending)",
            self.resolved,
            self.absent,
            self.hit_rate(),
            self.fetches,
            self.pending
        )
    }
}
