//! Authenticated encryption envelope for at-rest values.
//!
//! Wire layout: `magic(2B) ‖ salt(16B) ‖ nonce(12B) ‖ ciphertext ‖ tag(16B)`.
//! The salt is per-value (so password-derived keys never repeat across
//! values) and the nonce is drawn from the OS RNG per encryption, never
//! reused under a given key.

use crate::error::{CryptoError, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use rand::RngCore;
use zeroize::Zeroize;

const MAGIC: [u8; 2] = *b"K1";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Human-facing placeholder returned for an encrypted value read without a
/// key. Never contains plaintext or key material.
pub const ENCRYPTED_PLACEHOLDER: &str = "Encrypted — key required";

/// Derive a 256-bit AEAD key from a passphrase and salt via Argon2id.
///
/// The work factor (Argon2's default parameters) is calibrated to cost on
/// the order of tens of milliseconds per derivation, matching the spec's
/// "≥ tens of milliseconds per derivation" requirement.
fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; KEY_LEN]> {
    let argon2 = Argon2::default();
    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| CryptoError::KdfFailed(e.to_string()))?;
    Ok(key)
}

/// Encrypt `plaintext` under `password`, returning the full envelope
/// (`magic ‖ salt ‖ nonce ‖ ciphertext ‖ tag`).
pub fn encrypt(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let mut key_bytes = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    key_bytes.zeroize();

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::EncryptFailed)?;

    let mut out = Vec::with_capacity(MAGIC.len() + SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// Returns [`CryptoError::WrongKey`] specifically when the authenticator
/// tag fails to verify, so callers can distinguish "wrong password" from
/// "this isn't an encrypted payload at all".
pub fn decrypt(envelope: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    if envelope.len() < MAGIC.len() + SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Malformed);
    }
    if envelope[..MAGIC.len()] != MAGIC {
        return Err(CryptoError::Malformed);
    }
    let mut off = MAGIC.len();
    let salt: [u8; SALT_LEN] = envelope[off..off + SALT_LEN].try_into().unwrap();
    off += SALT_LEN;
    let nonce_bytes = &envelope[off..off + NONCE_LEN];
    off += NONCE_LEN;
    let ciphertext = &envelope[off..];

    let mut key_bytes = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    key_bytes.zeroize();

    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::WrongKey)
}

/// True if `payload` carries the envelope magic bytes.
pub fn is_encrypted(payload: &[u8]) -> bool {
    payload.len() >= MAGIC.len() && payload[..MAGIC.len()] == MAGIC
}
