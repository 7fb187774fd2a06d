//! Error taxonomy shared by every layer of the engine.
//!
//! Each crate boundary (storage, crypto, search, engine) defines its own
//! narrower error enum and converts into [`Error`] at the seam, the way the
//! original storage layer's error enum is `#[from]`-converted into a single
//! top-level error. Callers match on [`Error`] variants; the `Display` text
//! is for humans, not for control flow.

use crate::key::Key;
use thiserror::Error;

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all kybase operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied input failed a structural check: empty key, null
    /// value, malformed workspace name, or a collection op issued against
    /// the wrong workspace mode.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested key has no live entry.
    #[error("key not found")]
    NotFound,

    /// The key exists but the requested dotted sub-path does not.
    #[error("sub-path not found")]
    SubpathNotFound,

    /// A stored payload was encrypted and the supplied key failed to
    /// authenticate it.
    #[error("wrong key: authentication failed")]
    WrongKey,

    /// A stored payload is encrypted and no key was supplied.
    #[error("encrypted payload: key required")]
    KeyRequired,

    /// A kv-mode operation was issued against a collection workspace, or
    /// vice versa.
    #[error("type mismatch: operation not supported on this workspace")]
    TypeMismatch(String),

    /// The per-call deadline elapsed before a write transaction began.
    #[error("operation timed out")]
    Timeout,

    /// The workspace's backing store is already open by another process.
    #[error("workspace is locked by another process")]
    Locked,

    /// The backing store failed an integrity check and the engine has
    /// stopped accepting writes.
    #[error("store is corrupt: {0}")]
    CorruptStore(String),

    /// The pluggable schema validator rejected a candidate value.
    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    /// A transient write conflict; retried internally before reaching the
    /// caller, and a caller that sees it after exhausting retries may
    /// retry again at its own discretion.
    #[error("busy: transient write conflict")]
    RetryableBusy,

    /// I/O error from the backing file(s).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope or record framing failed to decode.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Construct a [`Error::Validation`] for an empty or blank key.
    pub fn empty_key() -> Self {
        Error::Validation("key cannot be empty".to_string())
    }

    /// Construct a [`Error::Validation`] for an empty value.
    pub fn empty_value() -> Self {
        Error::Validation("value cannot be empty".to_string())
    }

    /// Construct a [`Error::TypeMismatch`] naming the offending operation.
    pub fn type_mismatch(op: &str, mode: &str) -> Self {
        Error::TypeMismatch(format!("'{op}' not supported on a {mode} workspace"))
    }

    /// True if the engine should retry this error internally.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RetryableBusy)
    }
}

/// Convenience for producing a not-found error that remembers which key
/// was missing, used by callers that want to log without leaking values.
#[derive(Debug, Error)]
#[error("key not found: {key:?}")]
pub struct KeyNotFound {
    /// The key that was missing.
    pub key: Key,
}
