use serde_json::Value;
use crate::codec::envelope;
use crate::{Cipher, PhysicalStore, Result};

/// Re-stores a plain entry as an encrypted envelope, in place.
///
/// `raw` is the parsed entry exactly as it sits under `physical_key` (a TTL
/// envelope stays a TTL envelope, only sealed). Returns `Ok(true)` when a
/// write happened. Already-encrypted entries and disabled migration are no-ops,
/// so repeated reads migrate at most once.
pub fn maybe_migrate(
    store: &dyn PhysicalStore,
    physical_key: &str,
    raw: &Value,
    cipher: &dyn Cipher,
    enabled: bool,
) -> Result<bool> {
    if !enabled || envelope::is_encrypted_envelope(raw) {
        return Ok(false);
    }
    let plaintext = serde_json::to_string(raw)?;
    let sealed = envelope::seal(&plaintext, cipher)?;
    store.set(physical_key, &sealed)?;
    log::debug!("Migrated {} to the encrypted format", physical_key);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::envelope::{decode, Decoded};
    use crate::engine::{FnCipher, MemoryStore};
    use crate::Error;
    use serde_json::json;

    fn cipher() -> impl Cipher {
        FnCipher::new(
            |s: &str| Ok(format!("enc:{}", s)),
            |s: &str| s.strip_prefix("enc:").map(str::to_string).ok_or_else(|| Error::Decryption("bad".into())),
        )
    }

    #[test]
    fn test_migrates_plain_entry() {
        let store = MemoryStore::new();
        store.set("k", r#"{"a":1}"#).unwrap();
        let raw = json!({"a": 1});

        assert!(maybe_migrate(&store, "k", &raw, &cipher(), true).unwrap());

        let stored = store.get("k").unwrap();
        let parsed: Value = serde_json::from_str(&stored).unwrap();
        assert!(envelope::is_encrypted_envelope(&parsed));
        match decode(&stored, None, Some(&cipher()), 0) {
            Decoded::Value { value, .. } => assert_eq!(value, raw),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_already_encrypted_is_noop() {
        let store = MemoryStore::new();
        let raw = json!({"encrypted": true, "payload": "enc:1"});
        assert!(!maybe_migrate(&store, "k", &raw, &cipher(), true).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_disabled_is_noop() {
        let store = MemoryStore::new();
        assert!(!maybe_migrate(&store, "k", &json!(1), &cipher(), false).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_encrypt_failure_leaves_entry() {
        let store = MemoryStore::new();
        store.set("k", "1").unwrap();
        let broken = FnCipher::new(|_: &str| Err(Error::Cipher("down".into())), |s: &str| Ok(s.to_string()));
        assert!(maybe_migrate(&store, "k", &json!(1), &broken, true).is_err());
        assert_eq!(store.get("k").as_deref(), Some("1"));
    }
}
