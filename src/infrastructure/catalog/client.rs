//! Authenticated HTTP image fetcher for the catalog backend.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{Client, header};
use tracing::{debug, warn};

use crate::domain::entities::{AuthToken, CacheKey};
use crate::domain::errors::FetchError;
use crate::domain::ports::ImageFetchPort;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches image bytes over HTTP, attaching the session bearer token.
pub struct HttpImageFetcher {
    client: Client,
    token: RwLock<Option<AuthToken>>,
}

impl HttpImageFetcher {
    /// Creates a fetcher with the given request timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(timeout: Duration, token: Option<AuthToken>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, token))
    }

    /// Creates a fetcher around an already configured client.
    #[must_use]
    pub fn with_client(client: Client, token: Option<AuthToken>) -> Self {
        Self {
            client,
            token: RwLock::new(token),
        }
    }

    /// Replaces the session token used for subsequent requests.
    pub fn set_token(&self, token: Option<AuthToken>) {
        debug!(present = token.is_some(), "Updating image fetch credential");
        *self.token.write() = token;
    }

    /// Returns true if requests currently carry a credential.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    fn transport_error(e: &reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::transport("request timed out")
        } else if e.is_connect() {
            FetchError::transport("failed to connect to image host")
        } else {
            FetchError::transport(e.to_string())
        }
    }
}

impl std::fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("token", &*self.token.read())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, key: &CacheKey) -> Result<Bytes, FetchError> {
        let bearer = self.token.read().as_ref().map(AuthToken::bearer);

        let mut request = self.client.get(key.as_str());
        if let Some(bearer) = bearer {
            request = request.header(header::AUTHORIZATION, bearer);
        }

        debug!(key = %key, "Fetching image");

        let response = request.send().await.map_err(|e| {
            warn!(key = %key, error = %e, "Image request failed");
            Self::transport_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(key = %key, status = status.as_u16(), "Image request returned non-success status");
            return Err(FetchError::status(status.as_u16()));
        }

        response.bytes().await.map_err(|e| {
            warn!(key = %key, error = %e, "Failed to read image body");
            Self::transport_error(&e)
        })
    }
}
