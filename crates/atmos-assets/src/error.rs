//! Texture loading failures.

use std::time::Duration;

/// Why a texture could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The request failed or the server answered with a non-2xx status.
    #[error("fetching {url} failed: {reason}")]
    NetworkFailure { url: String, reason: String },

    /// No response arrived within the per-attempt timeout.
    #[error("fetching {url} timed out after {timeout:?}")]
    TimeoutExceeded { url: String, timeout: Duration },

    /// The bytes were not a decodable image.
    #[error("decoding image failed: {0}")]
    DecodeFailure(String),

    /// A GPU context, worker thread, or other resource was not available.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The load was aborted by its owner.
    #[error("load cancelled")]
    Cancelled,
}

impl LoadError {
    /// Build a [`LoadError::NetworkFailure`].
    pub fn network(url: &str, reason: impl ToString) -> Self {
        Self::NetworkFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
