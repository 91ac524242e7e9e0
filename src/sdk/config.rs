use std::fmt;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::engine::{MemoryStore, NullStore};
use crate::sdk::store::Store;
use crate::{Cipher, Clock, Error, PhysicalStore, Result, SystemClock};

/// Which physical store of a [`Backends`] pair a store view binds to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Long-lived storage (`localStorage` in a browser).
    #[default]
    Primary,
    /// Session-scoped storage (`sessionStorage` in a browser).
    Secondary,
}

/// Serializable construction options of a store view.
///
/// ```
/// use webstore::StoreOptions;
///
/// let opts = StoreOptions::from_json(r#"{"prefix": "app_", "ttl": 60000}"#).unwrap();
/// assert_eq!(opts.active_ttl(), Some(60000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreOptions {
    /// Prepended to every logical key to form the physical key.
    pub prefix: String,
    #[serde(rename = "type")]
    pub kind: StoreKind,
    /// Per-key fallback values, deep-merged under what is read.
    pub defaults: Map<String, Value>,
    /// Time-to-live in milliseconds. Only positive values take effect.
    pub ttl: Option<i64>,
}

impl StoreOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The TTL in effect, if any.
    pub fn active_ttl(&self) -> Option<u64> {
        self.ttl.filter(|t| *t > 0).map(|t| t as u64)
    }
}

/// Encryption hooks attached to a store view.
#[derive(Clone)]
pub struct Encryption {
    pub cipher: Arc<dyn Cipher>,
    /// Re-encrypt plain entries when they are read.
    pub migrate: bool,
}

impl Encryption {
    pub fn new(cipher: impl Cipher + 'static) -> Self {
        Self { cipher: Arc::new(cipher), migrate: false }
    }

    pub fn migrate(mut self, migrate: bool) -> Self {
        self.migrate = migrate;
        self
    }
}

impl fmt::Debug for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encryption").field("migrate", &self.migrate).finish_non_exhaustive()
    }
}

/// The pair of physical stores a [`StoreKind`] selects from.
#[derive(Clone)]
pub struct Backends {
    pub primary: Arc<dyn PhysicalStore>,
    pub secondary: Arc<dyn PhysicalStore>,
}

impl Backends {
    pub fn new(primary: Arc<dyn PhysicalStore>, secondary: Arc<dyn PhysicalStore>) -> Self {
        Self { primary, secondary }
    }

    /// Two independent in-memory stores.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Stores that keep nothing, for hosts without storage.
    pub fn null() -> Self {
        Self::new(Arc::new(NullStore), Arc::new(NullStore))
    }

    /// `localStorage` and `sessionStorage` of the current window.
    #[cfg(feature = "web")]
    pub fn browser() -> Self {
        use crate::engine::BrowserStore;
        Self::new(Arc::new(BrowserStore::local()), Arc::new(BrowserStore::session()))
    }

    pub fn select(&self, kind: StoreKind) -> Arc<dyn PhysicalStore> {
        match kind {
            StoreKind::Primary => self.primary.clone(),
            StoreKind::Secondary => self.secondary.clone(),
        }
    }
}

/// The operation that failed when a [`Failure`] is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Encoding or persisting a value.
    Write,
    /// Re-encrypting a plain entry during a read.
    Migrate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Write => f.write_str("write"),
            Operation::Migrate => f.write_str("migrate"),
        }
    }
}

/// A failure the facade absorbed instead of raising.
#[derive(Debug)]
pub struct Failure {
    pub op: Operation,
    /// Logical key (without prefix) the operation targeted.
    pub key: String,
    pub error: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} failed: {}", self.op, self.key, self.error)
    }
}

/// Receives every [`Failure`] a store view absorbs.
pub type ErrorSink = Arc<dyn Fn(&Failure) + Send + Sync>;

/// The default sink: logs each failure at error level.
pub fn log_sink() -> ErrorSink {
    Arc::new(|failure: &Failure| log::error!("{}", failure))
}

/// Fluent construction of a [`Store`].
pub struct StoreBuilder {
    options: StoreOptions,
    encryption: Option<Encryption>,
    clock: Arc<dyn Clock>,
    sink: ErrorSink,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::from_options(StoreOptions::default())
    }

    pub fn from_options(options: StoreOptions) -> Self {
        Self {
            options,
            encryption: None,
            clock: Arc::new(SystemClock),
            sink: log_sink(),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    pub fn kind(mut self, kind: StoreKind) -> Self {
        self.options.kind = kind;
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.defaults.insert(key.into(), value);
        self
    }

    pub fn defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.options.defaults = defaults;
        self
    }

    pub fn ttl_ms(mut self, ttl: i64) -> Self {
        self.options.ttl = Some(ttl);
        self
    }

    pub fn encryption(mut self, encryption: Encryption) -> Self {
        self.encryption = Some(encryption);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Routes absorbed failures to `sink` instead of the log.
    pub fn on_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(&Failure) + Send + Sync + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    /// Binds to the backend the configured [`StoreKind`] selects.
    pub fn build(self, backends: &Backends) -> Store {
        let backend = backends.select(self.options.kind);
        self.build_with(backend)
    }

    /// Binds to an explicit backend, ignoring the configured [`StoreKind`].
    pub fn build_with(self, backend: Arc<dyn PhysicalStore>) -> Store {
        Store::from_parts(backend, self.options, self.encryption, self.clock, self.sink)
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
