//! Error types for the sync layer.

use thiserror::Error;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error (connectivity, non-2xx response).
    #[error("network error: {0}")]
    Network(String),

    /// Network operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// Cryptographic failure (checksum mismatch, tag verification, KDF).
    #[error("cryptographic failure: {0}")]
    Crypto(#[from] vigil_crypto::CryptoError),

    /// Local storage failure (cannot read/write persisted state).
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A sync cycle is already in flight for this account.
    #[error("sync already in progress")]
    SyncInProgress,

    /// The server returned a response the client cannot interpret.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
}

impl SyncError {
    /// Whether the failure is transient and worth retrying later.
    ///
    /// Only transport-level failures qualify; cryptographic failures must
    /// never be retried with the same ciphertext, and storage failures are
    /// cycle-fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}
