//! The store facade and everything needed to construct one.
//!
//! A [`Store`] binds one physical store and one key prefix to the pipeline in
//! [`crate::codec`]. [`Node`] accessors reach into nested values; [`Watch`]
//! observes changes made through a shared backend.

pub mod config;
/// Host detection and backend initialization.
pub mod discovery;
pub mod node;
pub mod store;
pub mod watch;

pub use config::{Backends, Encryption, ErrorSink, Failure, Operation, StoreBuilder, StoreKind, StoreOptions};
pub use discovery::new;
pub use node::Node;
pub use store::{Lookup, Store};
pub use watch::Watch;
