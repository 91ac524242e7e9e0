//! Webstore is a typed, object-like view over synchronous key/value storage
//! (browser `localStorage`/`sessionStorage` or any backend with the same shape).
//!
//! Values are JSON. Every read and write runs through a small pipeline that
//! handles key namespacing, default values, time-based expiration, nested-path
//! mutation, and optional client-side encryption of stored payloads.
//!
//! ## Core Components
//! - [`engine`]: Physical store backends (memory, file, browser, null) and the built-in AES-GCM cipher.
//! - [`codec`]: The value-transformation pipeline (envelopes, paths, defaults, migration).
//! - [`sdk`]: The store facade, nested accessors, configuration, and change observation.

pub mod codec;
pub mod engine;
pub mod sdk;

use thiserror::Error;
use tokio::sync::broadcast;

pub use sdk::{Backends, Encryption, Lookup, Node, Store, StoreBuilder, StoreKind, StoreOptions};

/// Errors produced by the storage pipeline and its backends.
#[derive(Error, Debug)]
pub enum Error {
    /// A value could not be converted to or from its wire string.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The physical store refused a write because it is full.
    #[error("quota exceeded writing {key}: needed {needed} bytes, {available} available")]
    QuotaExceeded { key: String, needed: usize, available: usize },
    /// The physical store rejected an operation for another reason.
    #[error("store error: {0}")]
    Store(String),
    /// The decrypt hook failed or produced something that is not JSON.
    #[error("decryption failed: {0}")]
    Decryption(String),
    /// The encrypt hook failed.
    #[error("encryption failed: {0}")]
    Cipher(String),
    /// An I/O error occurred in a persistent backend.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for webstore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A change observed on a physical store.
///
/// `key` is `None` when the whole store was cleared. `new_value` is `None` when
/// the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub key: Option<String>,
    pub new_value: Option<String>,
}

/// The synchronous key/value capability every store view is bound to.
pub trait PhysicalStore: Send + Sync {
    /// Returns the string stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`. Fails when the backend is out of capacity.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);
    /// Removes every key.
    fn clear(&self);
    /// Lists every key currently stored.
    fn keys(&self) -> Vec<String>;
    /// Subscribes to changes, for backends that can observe them.
    fn subscribe(&self) -> Option<broadcast::Receiver<Change>> {
        None
    }
}

/// Caller-supplied encryption hooks, treated as opaque string transforms.
pub trait Cipher: Send + Sync {
    /// Turns serialized plaintext into a ciphertext string.
    fn encrypt(&self, plaintext: &str) -> Result<String>;
    /// Recovers the plaintext from a string produced by [`Cipher::encrypt`].
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}
