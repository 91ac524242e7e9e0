use crate::{PhysicalStore, Result};

/// The backend used where no storage exists.
///
/// Reads find nothing and writes succeed without effect, so a store view bound
/// to it behaves like an empty store that forgets everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl PhysicalStore for NullStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) {}

    fn clear(&self) {}

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }
}
