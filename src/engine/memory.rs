use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use crate::{Change, Error, PhysicalStore, Result};

const CHANNEL_CAPACITY: usize = 256;

struct Shared {
    data: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
    changes: broadcast::Sender<Change>,
}

/// An in-memory physical store.
///
/// Cloning a `MemoryStore` yields another handle to the same entries, which is
/// how several store views share one backend. An optional byte quota (key plus
/// value lengths, summed over all entries) makes writes fail the way a full
/// browser storage area does.
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Creates a store that rejects writes once `bytes` would be exceeded.
    pub fn with_quota(bytes: usize) -> Self {
        Self::build(Some(bytes))
    }

    fn build(quota: Option<usize>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                data: RwLock::new(BTreeMap::new()),
                quota,
                changes,
            }),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.shared.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, key: Option<&str>, new_value: Option<&str>) {
        // No receivers is the common case and not an error.
        let _ = self.shared.changes.send(Change {
            key: key.map(str::to_string),
            new_value: new_value.map(str::to_string),
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let data = self.shared.data.read().unwrap_or_else(PoisonError::into_inner);
        data.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut data = self.shared.data.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(quota) = self.shared.quota {
                let used: usize = data
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                let needed = key.len() + value.len();
                let available = quota.saturating_sub(used);
                if needed > available {
                    return Err(Error::QuotaExceeded { key: key.to_string(), needed, available });
                }
            }
            data.insert(key.to_string(), value.to_string());
        }
        self.notify(Some(key), Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) {
        let removed = {
            let mut data = self.shared.data.write().unwrap_or_else(PoisonError::into_inner);
            data.remove(key).is_some()
        };
        if removed {
            self.notify(Some(key), None);
        }
    }

    fn clear(&self) {
        self.shared.data.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.notify(None, None);
    }

    fn keys(&self) -> Vec<String> {
        let data = self.shared.data.read().unwrap_or_else(PoisonError::into_inner);
        data.keys().cloned().collect()
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<Change>> {
        Some(self.shared.changes.subscribe())
    }
}
