//! Error taxonomy for the sync engine.
//!
//! Three failure classes cross the crate boundary: a transient remote
//! failure (retried internally, then surfaced), an expired credential
//! (surfaced immediately for the auth layer to handle), and a local storage
//! failure (fatal to the request, not the process). Thin analytics inputs
//! are not errors anywhere - ergstats degrades instead.

use thiserror::Error;

/// Failures surfaced by the sync engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transient network or HTTP failure after the retry budget is spent.
    /// Callers may retry the whole operation later.
    #[error("remote API unavailable: {reason}")]
    RemoteUnavailable {
        reason: String,
        status: Option<u16>,
    },

    /// The bearer token was rejected. Never retried internally; the caller
    /// must re-authenticate before syncing again.
    #[error("authentication expired or revoked")]
    AuthExpired,

    /// The local cache could not be read or written. Fatal to the current
    /// request only.
    #[error("local store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SyncError {
    pub(crate) fn remote(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self::RemoteUnavailable {
            reason: reason.into(),
            status,
        }
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Result type alias for sync engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;
