//! Envelope codec: the wire format of a single stored entry.
//!
//! A logical value is optionally wrapped in a TTL envelope, serialized, and then
//! optionally encrypted and wrapped in an encrypted envelope. Reading peels the
//! layers in the opposite order, so expiry is always checked on plaintext.
//!
//! Envelopes are recognised by shape alone. A caller value that happens to look
//! like `{"encrypted": true, "payload": "..."}` or carries both `value` and a
//! numeric `expiresAtEpochMs` will be read back as an envelope.

use serde_json::{json, Value};
use crate::{Cipher, Error, Result};

/// Field holding the wrapped value in a TTL envelope.
pub const TTL_VALUE: &str = "value";
/// Field holding the expiry instant (ms since the Unix epoch) in a TTL envelope.
pub const TTL_EXPIRES: &str = "expiresAtEpochMs";
/// Sentinel flag of an encrypted envelope.
pub const ENCRYPTED: &str = "encrypted";
/// Ciphertext field of an encrypted envelope.
pub const PAYLOAD: &str = "payload";

/// Outcome of decoding a stored string.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The logical value, plus the parsed entry as it sits in the store.
    Value { value: Value, raw: Value },
    /// The TTL envelope has expired.
    Expired { raw: Value },
    /// The encrypted payload could not be decrypted into JSON.
    DecryptFailed { raw: Value },
    /// The stored string is not JSON; it is passed through as an opaque string.
    Unparseable(String),
}

/// True when `value` has the exact encrypted envelope shape.
pub fn is_encrypted_envelope(value: &Value) -> bool {
    value.get(ENCRYPTED) == Some(&Value::Bool(true))
        && value.get(PAYLOAD).is_some_and(Value::is_string)
}

/// True when `value` carries both TTL fields and the expiry is numeric.
pub fn is_ttl_envelope(value: &Value) -> bool {
    value.get(TTL_VALUE).is_some() && value.get(TTL_EXPIRES).is_some_and(Value::is_number)
}

/// Wraps an already-serialized document into an encrypted envelope string.
pub fn seal(plaintext: &str, cipher: &dyn Cipher) -> Result<String> {
    let payload = cipher.encrypt(plaintext)?;
    Ok(serde_json::to_string(&json!({ ENCRYPTED: true, PAYLOAD: payload }))?)
}

/// Encodes `value` for storage: TTL wrap, serialize, then encrypt.
pub fn encode(value: &Value, ttl_ms: Option<u64>, cipher: Option<&dyn Cipher>, now_ms: u64) -> Result<String> {
    let serialized = match ttl_ms.filter(|t| *t > 0) {
        Some(ttl) => {
            let expires = now_ms.checked_add(ttl).ok_or_else(|| Error::Internal("ttl overflows the clock".to_string()))?;
            serde_json::to_string(&json!({ TTL_VALUE: value, TTL_EXPIRES: expires }))?
        }
        None => serde_json::to_string(value)?,
    };

    match cipher {
        Some(cipher) => seal(&serialized, cipher),
        None => Ok(serialized),
    }
}

/// Decodes a stored string: parse, decrypt, then check expiry.
///
/// Never fails; each abnormal condition is reported as its own [`Decoded`] variant.
pub fn decode(stored: &str, ttl_ms: Option<u64>, cipher: Option<&dyn Cipher>, now_ms: u64) -> Decoded {
    let raw: Value = match serde_json::from_str(stored) {
        Ok(v) => v,
        Err(_) => return Decoded::Unparseable(stored.to_string()),
    };

    let mut working = raw.clone();
    if let Some(cipher) = cipher {
        if is_encrypted_envelope(&raw) {
            match open(&raw, cipher) {
                Ok(plain) => working = plain,
                Err(e) => {
                    log::warn!("Discarding undecryptable entry: {}", e);
                    return Decoded::DecryptFailed { raw };
                }
            }
        }
    }

    if ttl_ms.is_some_and(|t| t > 0) && is_ttl_envelope(&working) {
        let expires = working.get(TTL_EXPIRES).and_then(Value::as_f64).unwrap_or(0.0);
        if now_ms as f64 >= expires {
            return Decoded::Expired { raw };
        }
        working = working.get_mut(TTL_VALUE).map(Value::take).unwrap_or(Value::Null);
    }

    Decoded::Value { value: working, raw }
}

fn open(envelope: &Value, cipher: &dyn Cipher) -> Result<Value> {
    let payload = envelope
        .get(PAYLOAD)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Decryption("payload is not a string".to_string()))?;
    let plaintext = cipher.decrypt(payload)?;
    serde_json::from_str(&plaintext).map_err(|e| Error::Decryption(format!("payload is not JSON: {}", e)))
}
