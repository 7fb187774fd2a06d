//! Crypto-layer error type.

use thiserror::Error;

/// Result type alias for the crypto crate.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors produced by the encryption envelope.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed (invalid Argon2 parameters or salt).
    #[error("key derivation failed: {0}")]
    KdfFailed(String),

    /// Encryption failed (should not happen with valid input; surfaced
    /// defensively since the underlying AEAD API is fallible).
    #[error("encryption failed")]
    EncryptFailed,

    /// The authenticator tag failed to verify: wrong password.
    #[error("wrong key")]
    WrongKey,

    /// The payload is not a well-formed envelope.
    #[error("malformed encrypted payload")]
    Malformed,
}

impl From<CryptoError> for kybase_core::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::WrongKey => kybase_core::Error::WrongKey,
            CryptoError::Malformed => kybase_core::Error::CorruptStore("malformed envelope".to_string()),
            other => kybase_core::Error::Validation(other.to_string()),
        }
    }
}
