//! Bridges [`Value`] canonical encoding with the optional crypto
//! envelope, producing the byte payload `kybase-storage` actually
//! persists.

use kybase_core::{Error, Value};

/// The placeholder returned for an encrypted payload read without a key.
pub const ENCRYPTED_PLACEHOLDER: &str = kybase_crypto::ENCRYPTED_PLACEHOLDER;

/// Encode `value` to its canonical bytes and, if `master_key` is set,
/// wrap them in an encryption envelope. Returns `(bytes, encrypted)`.
pub fn encode(value: &Value, master_key: Option<&[u8]>) -> Result<(Vec<u8>, bool), Error> {
    let plaintext = value.canonical_encode().into_bytes();
    match master_key {
        Some(key) => {
            let envelope = kybase_crypto::encrypt(&plaintext, key)?;
            Ok((envelope, true))
        }
        None => Ok((plaintext, false)),
    }
}

/// Decode stored bytes back to a [`Value`].
///
/// If `encrypted` is true and no key is supplied, returns a `Value::Text`
/// placeholder rather than failing, matching the read-without-key
/// contract. A wrong key surfaces as [`Error::WrongKey`].
pub fn decode(bytes: &[u8], encrypted: bool, master_key: Option<&[u8]>) -> Result<Value, Error> {
    if !encrypted {
        return Ok(Value::from_canonical(&String::from_utf8_lossy(bytes)));
    }
    match master_key {
        None => Ok(Value::Text(ENCRYPTED_PLACEHOLDER.to_string())),
        Some(key) => {
            let plaintext = kybase_crypto::decrypt(bytes, key)?;
            Ok(Value::from_canonical(&String::from_utf8_lossy(&plaintext)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_without_encryption() {
        let (bytes, encrypted) = encode(&Value::Int(42), None).unwrap();
        assert!(!encrypted);
        assert_eq!(decode(&bytes, encrypted, None).unwrap(), Value::Int(42));
    }

    #[test]
    fn round_trips_with_encryption() {
        let (bytes, encrypted) = encode(&Value::Text("secret".to_string()), Some(b"pw")).unwrap();
        assert!(encrypted);
        assert_eq!(
            decode(&bytes, encrypted, Some(b"pw")).unwrap(),
            Value::Text("secret".to_string())
        );
    }

    #[test]
    fn decode_without_key_returns_placeholder() {
        let (bytes, encrypted) = encode(&Value::Text("secret".to_string()), Some(b"pw")).unwrap();
        let decoded = decode(&bytes, encrypted, None).unwrap();
        assert_eq!(decoded, Value::Text(ENCRYPTED_PLACEHOLDER.to_string()));
    }

    #[test]
    fn decode_with_wrong_key_errors() {
        let (bytes, encrypted) = encode(&Value::Text("secret".to_string()), Some(b"pw")).unwrap();
        let err = decode(&bytes, encrypted, Some(b"wrong")).unwrap_err();
        assert!(matches!(err, Error::WrongKey));
    }
}
