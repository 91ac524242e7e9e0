use crate::{Error, PhysicalStore, Result};

/// Which browser storage area a [`BrowserStore`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Local,
    Session,
}

/// A physical store backed by `window.localStorage` or `window.sessionStorage`.
///
/// The storage object is looked up on every call, so the handle itself holds no
/// JS values. Without a window or with storage disabled every call is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct BrowserStore {
    area: Area,
}

impl BrowserStore {
    pub fn local() -> Self {
        Self { area: Area::Local }
    }

    pub fn session() -> Self {
        Self { area: Area::Session }
    }

    fn storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        match self.area {
            Area::Local => window.local_storage().ok()?,
            Area::Session => window.session_storage().ok()?,
        }
    }
}

impl PhysicalStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let Some(storage) = self.storage() else {
            return Ok(());
        };
        storage
            .set_item(key, value)
            .map_err(|e| Error::Store(format!("setItem({}) rejected: {:?}", key, e)))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage() {
            let _ = storage.remove_item(key);
        }
    }

    fn clear(&self) {
        if let Some(storage) = self.storage() {
            let _ = storage.clear();
        }
    }

    fn keys(&self) -> Vec<String> {
        let Some(storage) = self.storage() else {
            return Vec::new();
        };
        let len = storage.length().unwrap_or(0);
        (0..len).filter_map(|i| storage.key(i).ok().flatten()).collect()
    }
}
