//! Error types for the client layer.

use std::time::Duration;

/// Local persistence errors.
///
/// The record store and sync queue report these internally; the repository
/// degrades them to "empty" or "no-op" and logs them.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt data under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: tally_engine::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Remote store errors.
///
/// Only payload rejections (see [`RemoteError::is_rejection`]) are final. On
/// a direct write they are returned to the caller, and during a drain the
/// entry is dropped. Every other variant is transient: the mutation is
/// queued, or stays queued, for the next drain.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid expense: {0}")]
    Validation(#[from] tally_engine::Error),

    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    /// Whether the remote refused the payload itself (retrying the same
    /// payload cannot succeed).
    ///
    /// Only 400 and 422 qualify. Auth, missing-route and conflict statuses
    /// can clear up without the payload changing, so they stay retryable.
    pub fn is_rejection(&self) -> bool {
        match self {
            RemoteError::Rejected { status, .. } => matches!(status, 400 | 422),
            RemoteError::Validation(_) => true,
            _ => false,
        }
    }
}

/// Errors surfaced to callers of the repository.
///
/// Transient remote failures never show up here: the local write already
/// succeeded and the mutation is queued. A remote rejection of a direct
/// write is reported, but the local write stays in place.
/// `Remote` is also returned when a configured remote cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid expense: {0}")]
    Invalid(#[from] tally_engine::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),
}

/// Result type alias for repository calls.
pub type Result<T> = std::result::Result<T, Error>;
