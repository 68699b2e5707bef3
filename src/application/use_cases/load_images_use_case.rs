//! Batch image loading use case.

use futures_util::future::join_all;
use tracing::{debug, info};

use crate::application::dto::{LoadReport, LoadStatus};
use crate::application::services::ImageFetchCache;
use crate::domain::entities::movie_poster_path;

/// Short human readable summary of a handle.
pub trait DescribeHandle {
    /// Describes the handle for reports.
    fn describe(&self) -> String;
}

/// Loads a batch of references through the shared cache.
#[derive(Debug, Clone)]
pub struct LoadImagesUseCase<H> {
    cache: ImageFetchCache<H>,
}

impl<H> LoadImagesUseCase<H>
where
    H: DescribeHandle + Clone + Send + Sync + 'static,
{
    /// Creates new use case over `cache`.
    #[must_use]
    pub const fn new(cache: ImageFetchCache<H>) -> Self {
        Self { cache }
    }

    /// Loads every URL and movie poster concurrently; reports keep input order
    /// with URLs first.
    pub async fn execute(&self, urls: &[String], poster_ids: &[String]) -> Vec<LoadReport> {
        let refs: Vec<String> = urls
            .iter()
            .cloned()
            .chain(poster_ids.iter().map(|id| movie_poster_path(id)))
            .collect();

        debug!(count = refs.len(), "Loading image batch");

        let reports = join_all(refs.iter().map(|raw| self.load_one(raw))).await;

        let loaded = reports.iter().filter(|r| r.status.is_loaded()).count();
        info!(requested = reports.len(), loaded, "Image batch settled");

        reports
    }

    async fn load_one(&self, raw: &str) -> LoadReport {
        let normalized = self.cache.normalize(raw);
        let status = match self.cache.load(raw).await {
            Ok(Some(handle)) => LoadStatus::Loaded {
                handle: handle.describe(),
            },
            Ok(None) => LoadStatus::Missing,
            Err(e) => LoadStatus::Failed {
                error: e.to_string(),
            },
        };

        LoadReport::new(raw, normalized.key.into_inner(), normalized.kind, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::domain::errors::FetchError;
    use crate::domain::ports::mocks::{CountingHandles, ScriptedFetcher, TestHandle};
    use crate::infrastructure::catalog::{CatalogUrlNormalizer, DEFAULT_CATALOG_IMAGE_BASE};

    impl DescribeHandle for TestHandle {
        fn describe(&self) -> String {
            format!("handle#{}", self.serial)
        }
    }

    #[tokio::test]
    async fn test_batch_reports_in_order() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.respond("http://host/img/a", Ok(Bytes::from_static(b"a")));
        fetcher.respond(
            "http://host/api/v1/movies/9/poster",
            Err(FetchError::transport("reset")),
        );
        let normalizer = Arc::new(
            CatalogUrlNormalizer::new("http://host", DEFAULT_CATALOG_IMAGE_BASE)
                .expect("valid bases"),
        );
        let cache = ImageFetchCache::new(
            fetcher.clone(),
            Arc::new(CountingHandles::new()),
            normalizer,
            NonZeroUsize::new(2).expect("non-zero"),
        );
        let use_case = LoadImagesUseCase::new(cache);

        let reports = use_case
            .execute(
                &["/img/a".to_string(), "/img/gone".to_string(), "/img/a".to_string()],
                &["9".to_string()],
            )
            .await;

        assert_eq!(reports.len(), 4);
        assert_eq!(
            reports[0].status,
            LoadStatus::Loaded {
                handle: "handle#1".into()
            }
        );
        assert_eq!(reports[1].status, LoadStatus::Missing);
        assert_eq!(reports[2].status, reports[0].status);
        assert!(matches!(reports[3].status, LoadStatus::Failed { .. }));
        assert_eq!(reports[3].key, "http://host/api/v1/movies/9/poster");
        assert_eq!(fetcher.call_count(), 3);
    }
}
