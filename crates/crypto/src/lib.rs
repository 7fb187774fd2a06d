//! The crypto envelope: password-derived authenticated encryption for
//! values at rest.
//!
//! Mode is per-operation: callers decide, per value, whether to call
//! [`encrypt`] before handing bytes to storage. The engine crate owns the
//! policy of *when* to encrypt; this crate only owns *how*.

#![warn(missing_docs)]

pub mod envelope;
pub mod error;

pub use envelope::{decrypt, encrypt, is_encrypted, ENCRYPTED_PLACEHOLDER};
pub use error::{CryptoError, Result};
