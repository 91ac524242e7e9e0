use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use crate::codec::{self, defaults, migrate, path, Decoded};
use crate::sdk::config::{Encryption, ErrorSink, Failure, Operation, StoreBuilder, StoreOptions};
use crate::sdk::node::Node;
use crate::sdk::watch::Watch;
use crate::{Cipher, Clock, Error, PhysicalStore};

/// A typed view over one physical store under one key prefix.
///
/// Reads never fail: a missing, expired or undecryptable entry resolves to the
/// configured default (or `None`), and a stored string that is not JSON comes
/// back verbatim. Writes never fail either; encoding and backend errors are
/// handed to the error sink and the call returns normally.
pub struct Store {
    backend: Arc<dyn PhysicalStore>,
    prefix: String,
    defaults: Map<String, Value>,
    ttl: Option<u64>,
    encryption: Option<Encryption>,
    clock: Arc<dyn Clock>,
    sink: ErrorSink,
}

/// What a key or nested path resolves to.
pub enum Lookup<'a> {
    /// A mapping; further properties are reached through the accessor.
    Object(Node<'a>),
    /// A scalar, an array, or a raw unparseable string.
    Value(Value),
}

/// A decoded root entry, before defaults are applied.
pub(crate) enum Root {
    Missing,
    Value(Value),
    Raw(String),
}

impl Root {
    /// The root as a value to mutate; nothing stored reads as `null`.
    pub(crate) fn into_value(self) -> Value {
        match self {
            Root::Missing => Value::Null,
            Root::Value(v) => v,
            Root::Raw(s) => Value::String(s),
        }
    }
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn from_parts(
        backend: Arc<dyn PhysicalStore>,
        options: StoreOptions,
        encryption: Option<Encryption>,
        clock: Arc<dyn Clock>,
        sink: ErrorSink,
    ) -> Self {
        let ttl = options.active_ttl();
        Self {
            backend,
            prefix: options.prefix,
            defaults: options.defaults,
            ttl,
            encryption,
            clock,
            sink,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The physical key a logical key is stored under.
    pub fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn cipher(&self) -> Option<&dyn Cipher> {
        self.encryption.as_ref().map(|e| e.cipher.as_ref())
    }

    pub(crate) fn report(&self, op: Operation, key: &str, error: Error) {
        (self.sink)(&Failure { op, key: key.to_string(), error });
    }

    /// Reads and decodes the entry at `key`.
    ///
    /// Expired and undecryptable entries are deleted on the way; plain entries
    /// are migrated when encryption asks for it.
    pub(crate) fn read_root(&self, key: &str) -> Root {
        let physical = self.physical_key(key);
        let Some(stored) = self.backend.get(&physical) else {
            return Root::Missing;
        };

        match codec::decode(&stored, self.ttl, self.cipher(), self.clock.now_ms()) {
            Decoded::Value { value, raw } => {
                if let Some(enc) = &self.encryption {
                    let res = migrate::maybe_migrate(self.backend.as_ref(), &physical, &raw, enc.cipher.as_ref(), enc.migrate);
                    if let Err(e) = res {
                        self.report(Operation::Migrate, key, e);
                    }
                }
                Root::Value(value)
            }
            Decoded::Expired { .. } => {
                debug!("Entry {} expired, removing", physical);
                self.backend.remove(&physical);
                Root::Missing
            }
            Decoded::DecryptFailed { .. } => {
                self.backend.remove(&physical);
                Root::Missing
            }
            Decoded::Unparseable(raw) => Root::Raw(raw),
        }
    }

    /// Encodes and persists a whole root value.
    pub(crate) fn write_root(&self, key: &str, value: &Value) {
        let encoded = match codec::encode(value, self.ttl, self.cipher(), self.clock.now_ms()) {
            Ok(s) => s,
            Err(e) => return self.report(Operation::Write, key, e),
        };
        if let Err(e) = self.backend.set(&self.physical_key(key), &encoded) {
            self.report(Operation::Write, key, e);
        }
    }

    /// Returns the value at `key`, with defaults merged in.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.read_root(key) {
            Root::Missing => self.defaults.get(key).cloned(),
            Root::Value(v) => defaults::resolve(self.defaults.get(key), Some(v)),
            Root::Raw(s) => Some(Value::String(s)),
        }
    }

    /// Returns the value at `key` deserialized as `T`.
    ///
    /// A value that does not fit `T` reads as `None`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        serde_json::from_value(self.get(key)?).ok()
    }

    /// Stores `value` at `key`, replacing whatever was there.
    pub fn set(&self, key: &str, value: Value) {
        self.write_root(key, &value);
    }

    /// Serializes `value` and stores it at `key`.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.set(key, v),
            Err(e) => self.report(Operation::Write, key, e.into()),
        }
    }

    /// True when a live entry is stored at `key`, or a default is declared for it.
    pub fn has(&self, key: &str) -> bool {
        match self.read_root(key) {
            Root::Missing => self.defaults.contains_key(key),
            Root::Value(_) | Root::Raw(_) => true,
        }
    }

    /// Removes the entry at `key`. A missing key is a no-op.
    pub fn delete(&self, key: &str) {
        self.backend.remove(&self.physical_key(key));
    }

    /// Removes every entry under this view's prefix, leaving other keys alone.
    pub fn clear_all(&self) {
        if self.prefix.is_empty() {
            self.backend.clear();
            return;
        }
        for physical in self.backend.keys() {
            if physical.starts_with(&self.prefix) {
                self.backend.remove(&physical);
            }
        }
    }

    /// Logical keys stored under the prefix, together with every defaulted key.
    ///
    /// Entries are listed without being decoded, so an expired entry still shows
    /// up here until something reads it.
    pub fn keys(&self) -> BTreeSet<String> {
        self.backend
            .keys()
            .into_iter()
            .filter_map(|physical| physical.strip_prefix(&self.prefix).map(str::to_string))
            .chain(self.defaults.keys().cloned())
            .collect()
    }

    /// Resolves `key` to either a nested accessor or a plain value.
    pub fn lookup(&self, key: &str) -> Option<Lookup<'_>> {
        self.entry(key).lookup()
    }

    /// A nested accessor rooted at `key`.
    pub fn entry(&self, key: &str) -> Node<'_> {
        Node::new(self, key)
    }

    /// Observes changes to this view's keys made through the shared backend.
    ///
    /// `None` when the backend cannot report changes.
    pub fn watch(&self) -> Option<Watch> {
        Some(Watch::new(self.backend.subscribe()?, self.prefix.clone()))
    }

    pub(crate) fn default_for(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// Sets `property` at `parent` inside the root at `key`, as one full
    /// read-modify-write of that root.
    pub(crate) fn write_nested(&self, key: &str, parent: &[String], property: &str, value: Value) {
        let root = self.read_root(key).into_value();
        let updated = path::write_at_path(root, parent, property, value);
        self.write_root(key, &updated);
    }

    /// Removes `property` at `parent` inside the root at `key`.
    pub(crate) fn remove_nested(&self, key: &str, parent: &[String], property: &str) {
        let Root::Value(root) = self.read_root(key) else {
            return;
        };
        let (updated, removed) = path::remove_at_path(root, parent, property);
        if removed {
            self.write_root(key, &updated);
        }
    }

    /// Keys visible at `at` inside the root at `key`.
    pub(crate) fn keys_at(&self, key: &str, at: &[String]) -> BTreeSet<String> {
        let stored = match self.read_root(key) {
            Root::Value(v) => Some(v),
            Root::Raw(s) => Some(Value::String(s)),
            Root::Missing => None,
        };
        path::keys_at_path(stored.as_ref(), self.default_for(key), at)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("prefix", &self.prefix)
            .field("defaults", &self.defaults)
            .field("ttl", &self.ttl)
            .field("encryption", &self.encryption)
            .finish_non_exhaustive()
    }
}
