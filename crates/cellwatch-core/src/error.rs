//! Error types for cellwatch.
//!
//! Two layers exist. [`Error`] is the crate-level error returned by builders,
//! configuration, and store adapters. [`DedupError`] is the per-file taxonomy
//! carried inside a `Classification::Failed` and never propagated past a batch
//! boundary.

use thiserror::Error;

/// Result type alias using cellwatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cellwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Record store is unreachable or returned an unusable answer
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

/// Per-file failure recorded while checking a batch.
///
/// Every variant is recoverable: the batch keeps going and the file is
/// classified (or, on the client side, falls back to `New`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DedupError {
    /// The encoded payload could not be decoded. Only the fragment size is kept.
    #[error("payload decode failed ({fragment_len} bytes): {message}")]
    HashDecode { fragment_len: usize, message: String },

    /// A caller-supplied content identity was not a 64-char hex digest.
    #[error("invalid content identity: {0}")]
    InvalidIdentity(String),

    /// The batch lookup against the record store failed.
    #[error("record store unavailable: {0}")]
    LookupUnavailable(String),

    /// The remote classification call did not answer in time.
    #[error("remote check timed out after {timeout_ms}ms")]
    RemoteTimeout { timeout_ms: u64 },

    /// Network failure or non-success HTTP status from the remote endpoint.
    #[error("remote check failed: {0}")]
    Remote(String),

    /// The remote endpoint answered with something we could not interpret.
    #[error("malformed remote response: {0}")]
    RemoteProtocol(String),

    /// The per-file task itself failed (panic or cancellation).
    #[error("internal check failure: {0}")]
    Internal(String),
}

impl DedupError {
    /// Short machine-friendly kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DedupError::HashDecode { .. } => "hash_decode",
            DedupError::InvalidIdentity(_) => "invalid_identity",
            DedupError::LookupUnavailable(_) => "lookup_unavailable",
            DedupError::RemoteTimeout { .. } => "remote_timeout",
            DedupError::Remote(_) => "remote",
            DedupError::RemoteProtocol(_) => "remote_protocol",
            DedupError::Internal(_) => "internal",
        }
    }
}
