use std::collections::BTreeSet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use crate::codec::path;
use crate::sdk::config::Operation;
use crate::sdk::store::{Lookup, Store};

/// An accessor bound to one nested location: a root key plus a property path.
///
/// Nothing is cached. Every read decodes the root entry again, and every write
/// is a full read-modify-write of the root, so `user.profile.bio = "x"`
/// rewrites the whole `user` entry.
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use webstore::{engine::MemoryStore, Store};
///
/// let store = Store::builder().build_with(Arc::new(MemoryStore::new()));
/// store.entry("user").at("profile").at("bio").set(json!("x"));
/// assert_eq!(store.get("user"), Some(json!({"profile": {"bio": "x"}})));
/// ```
#[derive(Clone)]
pub struct Node<'a> {
    store: &'a Store,
    key: String,
    path: Vec<String>,
}

impl<'a> Node<'a> {
    pub(crate) fn new(store: &'a Store, key: &str) -> Self {
        Self { store, key: key.to_string(), path: Vec::new() }
    }

    /// The root key this accessor lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Property names from the root to this location.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The accessor for `property` one level down.
    pub fn at(&self, property: &str) -> Node<'a> {
        let mut path = self.path.clone();
        path.push(property.to_string());
        Node { store: self.store, key: self.key.clone(), path }
    }

    /// The value here, with defaults merged in at the root.
    pub fn get(&self) -> Option<Value> {
        let root = self.store.get(&self.key)?;
        path::read_at_path(&root, &self.path).cloned()
    }

    pub fn get_as<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.get()?).ok()
    }

    /// A nested accessor when the value here is a mapping, the value otherwise.
    pub fn lookup(&self) -> Option<Lookup<'a>> {
        let value = self.get()?;
        if value.is_object() {
            Some(Lookup::Object(self.clone()))
        } else {
            Some(Lookup::Value(value))
        }
    }

    /// Replaces the value here.
    pub fn set(&self, value: Value) {
        match self.path.split_last() {
            None => self.store.set(&self.key, value),
            Some((property, parent)) => self.store.write_nested(&self.key, parent, property, value),
        }
    }

    pub fn set_as<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.set(v),
            Err(e) => self.store.report(Operation::Write, &self.key, e.into()),
        }
    }

    /// Whether `property` exists here, stored or defaulted.
    pub fn has(&self, property: &str) -> bool {
        self.keys().contains(property)
    }

    /// Property names visible here, stored or defaulted.
    pub fn keys(&self) -> BTreeSet<String> {
        self.store.keys_at(&self.key, &self.path)
    }

    /// Deletes the value here. At the root this deletes the whole entry.
    pub fn remove(&self) {
        match self.path.split_last() {
            None => self.store.delete(&self.key),
            Some((property, parent)) => self.store.remove_nested(&self.key, parent, property),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryStore;
    use crate::PhysicalStore;
    use serde_json::json;
    use std::sync::Arc;

    fn fixture() -> (MemoryStore, Store) {
        let backend = MemoryStore::new();
        let store = Store::builder()
            .with_default("user", json!({"name": "Anon", "role": "guest", "prefs": {"theme": "light"}}))
            .build_with(Arc::new(backend.clone()));
        (backend, store)
    }

    #[test]
    fn test_nested_write_keeps_siblings() {
        let (backend, store) = fixture();
        store.set("user", json!({"name": "Alice", "age": 30}));
        store.entry("user").at("name").set(json!("Bob"));

        assert_eq!(backend.get("user").as_deref(), Some(r#"{"age":30,"name":"Bob"}"#));
    }

    #[test]
    fn test_nested_write_without_entry_skips_defaults() {
        let (backend, store) = fixture();
        store.entry("user").at("prefs").at("lang").set(json!("fr"));

        assert_eq!(backend.get("user").as_deref(), Some(r#"{"prefs":{"lang":"fr"}}"#));
        assert_eq!(
            store.get("user"),
            Some(json!({"name": "Anon", "role": "guest", "prefs": {"theme": "light", "lang": "fr"}}))
        );
    }

    #[test]
    fn test_nested_read_sees_defaults() {
        let (_, store) = fixture();
        store.set("user", json!({"name": "Alice"}));
        assert_eq!(store.entry("user").at("role").get(), Some(json!("guest")));
        assert_eq!(store.entry("user").at("prefs").at("theme").get(), Some(json!("light")));
        assert_eq!(store.entry("user").at("name").at("first").get(), None);
    }

    #[test]
    fn test_has_and_keys() {
        let (_, store) = fixture();
        store.set("user", json!({"name": "Alice", "age": 3}));
        let user = store.entry("user");
        assert!(user.has("age"));
        assert!(user.has("role"));
        assert!(!user.has("email"));
        assert_eq!(user.keys().into_iter().collect::<Vec<_>>(), vec!["age", "name", "prefs", "role"]);
        assert!(user.at("prefs").has("theme"));
    }

    #[test]
    fn test_has_agrees_with_get_over_stored_scalar() {
        let (backend, store) = fixture();
        store.set("user", json!({"prefs": 3}));
        let prefs = store.entry("user").at("prefs");

        assert_eq!(prefs.get(), Some(json!(3)));
        assert_eq!(prefs.at("theme").get(), None);
        assert!(!prefs.has("theme"));
        assert!(prefs.keys().is_empty());
        assert!(store.entry("user").has("role"));

        backend.set("user", "legacy{").unwrap();
        assert_eq!(store.get("user"), Some(json!("legacy{")));
        assert!(!store.entry("user").has("role"));
    }

    #[test]
    fn test_lookup_branches() {
        let (_, store) = fixture();
        store.set("count", json!(3));
        store.set("tags", json!(["a"]));

        assert!(matches!(store.lookup("user"), Some(Lookup::Object(n)) if n.key() == "user"));
        assert!(matches!(store.lookup("count"), Some(Lookup::Value(v)) if v == json!(3)));
        assert!(matches!(store.lookup("tags"), Some(Lookup::Value(Value::Array(_)))));
        assert!(store.lookup("nothing").is_none());

        match store.entry("user").at("prefs").lookup() {
            Some(Lookup::Object(prefs)) => assert_eq!(prefs.path(), ["prefs".to_string()]),
            _ => panic!("prefs should resolve to a mapping"),
        }
    }

    #[test]
    fn test_remove_nested_and_root() {
        let (backend, store) = fixture();
        store.set("user", json!({"name": "Alice", "age": 30}));

        store.entry("user").at("age").remove();
        assert_eq!(backend.get("user").as_deref(), Some(r#"{"name":"Alice"}"#));

        store.entry("user").at("missing").remove();
        store.entry("user").remove();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_nested_write_over_raw_string() {
        let (backend, store) = fixture();
        backend.set("user", "legacy{").unwrap();
        store.entry("user").at("name").set(json!("Zed"));
        assert_eq!(backend.get("user").as_deref(), Some(r#"{"name":"Zed"}"#));
    }

    #[test]
    fn test_typed_nested_access() {
        let (_, store) = fixture();
        store.entry("user").at("age").set_as(&41u32);
        assert_eq!(store.entry("user").at("age").get_as::<u32>(), Some(41));
    }
}
