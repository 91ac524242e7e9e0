use std::env;
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
use std::{path::Path, sync::Arc};
use crate::sdk::config::Backends;
use crate::Result;
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
use crate::engine::{FileStore, MemoryStore};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "WEBSTORE_DATA_DIR";

/// File name of the persistent primary store inside the data directory.
pub const PRIMARY_FILE: &str = "primary.json";

/// Picks the physical stores for the current host.
///
/// 1. In a browser build (feature `web` on `wasm32`), `localStorage` and
///    `sessionStorage` are used and `data_dir` is ignored.
/// 2. Otherwise the primary store is a [`FileStore`] at
///    `<data_dir>/primary.json` and the secondary store is in-memory, living as
///    long as the process. `WEBSTORE_DATA_DIR`, when set, replaces `data_dir`.
///
/// # Examples
///
/// ```no_run
/// use webstore::{sdk, Store};
///
/// fn main() -> anyhow::Result<()> {
///     let backends = sdk::new("./data")?;
///     let store = Store::builder().prefix("app_").build(&backends);
///     store.set("greeting", serde_json::json!("hello"));
///     Ok(())
/// }
/// ```
pub fn new(data_dir: &str) -> Result<Backends> {
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    {
        let _ = data_dir;
        Ok(Backends::browser())
    }
    #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
    {
        let dir = resolve_data_dir(data_dir);
        let primary = FileStore::open(Path::new(&dir).join(PRIMARY_FILE))?;
        log::debug!("Primary store at {:?}", primary.path());
        Ok(Backends::new(Arc::new(primary), Arc::new(MemoryStore::new())))
    }
}

/// The data directory in effect: the environment override or `data_dir`.
pub fn resolve_data_dir(data_dir: &str) -> String {
    env::var(DATA_DIR_ENV)
        .ok()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| data_dir.to_string())
}

#[cfg(all(test, not(all(feature = "web", target_arch = "wasm32"))))]
mod tests {
    use super::*;
    use crate::PhysicalStore;
    use tempfile::tempdir;

    #[test]
    fn test_primary_is_persistent() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        if env::var(DATA_DIR_ENV).is_ok() {
            return;
        }

        let backends = new(data_dir).unwrap();
        backends.primary.set("k", "1").unwrap();
        backends.secondary.set("s", "2").unwrap();

        let reopened = new(data_dir).unwrap();
        assert_eq!(reopened.primary.get("k").as_deref(), Some("1"));
        assert_eq!(reopened.secondary.get("s"), None);
        assert!(dir.path().join(PRIMARY_FILE).exists());
    }
}
