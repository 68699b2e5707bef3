//! Image fetch and load error types.

use thiserror::Error;

/// Failure reported by an authenticated fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("server responded with HTTP {status}")]
    Status { status: u16 },

    /// Request never produced a response (connect, timeout, body read).
    #[error("transport failure: {message}")]
    Transport { message: String },
}

impl FetchError {
    /// Creates status error.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self::Status { status }
    }

    /// Creates transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns whether the failure is an expected miss (not found, forbidden, ...).
    #[must_use]
    pub const fn is_soft_miss(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

/// Failure turning fetched bytes into a handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// Payload is not an image format we can display.
    #[error("unsupported image payload: {0}")]
    Unsupported(String),

    /// Payload claimed a known format but failed to decode.
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Error delivered to the callers whose fetch failed hard.
///
/// Soft misses never surface as a `LoadError`; they resolve to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Transport failure while fetching.
    #[error("network error: {0}")]
    Network(String),

    /// Bytes arrived but could not become a handle.
    #[error("decode error: {0}")]
    Decode(String),

    /// The fetch job stopped before producing an outcome.
    #[error("image load interrupted: {0}")]
    Interrupted(String),
}

impl From<HandleError> for LoadError {
    fn from(err: HandleError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl LoadError {
    /// Returns whether the error came from the network layer.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
