use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use crate::{Cipher, Error, Result};

const NONCE_LEN: usize = 12;

/// AES-256-GCM encryption hooks.
///
/// Ciphertext is hex-encoded and carries the 12-byte nonce followed by the
/// sealed bytes, so it can sit inside a JSON string.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Builds the cipher from a 32-byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(Error::Cipher("key must be 32 bytes".to_string()));
        }
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| Error::Cipher(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Builds the cipher from a hex-encoded 32-byte key.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key = hex::decode(key_hex.trim()).map_err(|e| Error::Cipher(e.to_string()))?;
        Self::new(&key)
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| Error::Cipher(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(hex::encode(combined))
    }

    fn decrypt(&self, cipher_hex: &str) -> Result<String> {
        let combined = hex::decode(cipher_hex).map_err(|e| Error::Decryption(e.to_string()))?;
        if combined.len() < NONCE_LEN {
            return Err(Error::Decryption("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext_bytes = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| Error::Decryption("wrong key or tampered data".to_string()))?;
        String::from_utf8(plaintext_bytes).map_err(|e| Error::Decryption(e.to_string()))
    }
}

/// Adapts a pair of closures into [`Cipher`] hooks.
pub struct FnCipher<E, D> {
    encrypt: E,
    decrypt: D,
}

impl<E, D> FnCipher<E, D>
where
    E: Fn(&str) -> Result<String> + Send + Sync,
    D: Fn(&str) -> Result<String> + Send + Sync,
{
    pub fn new(encrypt: E, decrypt: D) -> Self {
        Self { encrypt, decrypt }
    }
}

impl<E, D> Cipher for FnCipher<E, D>
where
    E: Fn(&str) -> Result<String> + Send + Sync,
    D: Fn(&str) -> Result<String> + Send + Sync,
{
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        (self.encrypt)(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        (self.decrypt)(ciphertext)
    }
}
