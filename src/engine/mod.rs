pub mod file;
pub mod memory;
pub mod null;
pub mod vault;
#[cfg(feature = "web")]
pub mod web;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use null::NullStore;
pub use vault::{AesGcmCipher, FnCipher};
#[cfg(feature = "web")]
pub use web::BrowserStore;
