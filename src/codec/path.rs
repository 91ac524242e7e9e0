//! Path resolver: reads and writes at nested locations inside one root value.
//!
//! A nested write never touches the store on its own. The caller decodes the
//! whole root, mutates it here, and re-encodes the whole root.

use std::collections::BTreeSet;
use serde_json::{Map, Value};

/// Walks `root` along `path`. Returns `None` as soon as a step is missing or
/// lands on something that is not a mapping.
pub fn read_at_path<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| current.as_object()?.get(segment.as_ref()))
}

/// Sets `property` on the mapping found at `path`, creating mappings on the way.
///
/// A non-mapping root or intermediate is replaced by an empty mapping so the
/// write always lands. Returns the updated root.
pub fn write_at_path<S: AsRef<str>>(root: Value, path: &[S], property: &str, value: Value) -> Value {
    let mut root = into_object(root);
    let mut current = &mut root;
    for segment in path {
        let map = ensure_object(current);
        let child = map.entry(segment.as_ref().to_string()).or_insert(Value::Null);
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        current = child;
    }
    ensure_object(current).insert(property.to_string(), value);
    root
}

/// Removes `property` from the mapping at `path`.
///
/// Returns the root, unchanged when nothing was there, and whether a property was
/// actually removed.
pub fn remove_at_path<S: AsRef<str>>(mut root: Value, path: &[S], property: &str) -> (Value, bool) {
    let removed = path
        .iter()
        .try_fold(&mut root, |current, segment| current.as_object_mut()?.get_mut(segment.as_ref()))
        .and_then(Value::as_object_mut)
        .is_some_and(|map| map.remove(property).is_some());
    (root, removed)
}

/// Keys visible at `path`: those stored there unioned with those declared by
/// the defaults at the same path.
///
/// Default keys only count where the defaults would survive a merge, that is
/// where nothing on the stored side up to `path` is a non-mapping. This keeps
/// the key set in line with what reading the merged value returns.
pub fn keys_at_path<S: AsRef<str>>(stored: Option<&Value>, defaults: Option<&Value>, path: &[S]) -> BTreeSet<String> {
    let defaults = defaults.filter(|_| defaults_reach(stored, path));
    [stored, defaults]
        .into_iter()
        .flatten()
        .filter_map(|root| read_at_path(root, path)?.as_object())
        .flat_map(|map| map.keys().cloned())
        .collect()
}

/// True when every stored value along `path` is a mapping or absent.
fn defaults_reach<S: AsRef<str>>(stored: Option<&Value>, path: &[S]) -> bool {
    let mut current = stored;
    for segment in path {
        match current {
            None => return true,
            Some(Value::Object(map)) => current = map.get(segment.as_ref()),
            Some(_) => return false,
        }
    }
    current.map_or(true, Value::is_object)
}

fn into_object(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        Value::Object(Map::new())
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EMPTY: [&str; 0] = [];

    #[test]
    fn test_read_walks_mappings() {
        let root = json!({"user": {"profile": {"bio": "hi"}}});
        assert_eq!(read_at_path(&root, &["user", "profile", "bio"]), Some(&json!("hi")));
        assert_eq!(read_at_path(&root, &EMPTY), Some(&root));
        assert_eq!(read_at_path(&root, &["user", "missing", "bio"]), None);
    }

    #[test]
    fn test_read_stops_at_non_mapping() {
        let root = json!({"a": null, "b": [ {"c": 1} ], "d": "str"});
        assert_eq!(read_at_path(&root, &["a", "x"]), None);
        assert_eq!(read_at_path(&root, &["b", "0"]), None);
        assert_eq!(read_at_path(&root, &["d", "len"]), None);
        assert_eq!(read_at_path(&root, &["a"]), Some(&Value::Null));
    }

    #[test]
    fn test_write_keeps_siblings() {
        let root = json!({"name": "Alice", "age": 30});
        let out = write_at_path(root, &EMPTY, "name", json!("Bob"));
        assert_eq!(out, json!({"name": "Bob", "age": 30}));
    }

    #[test]
    fn test_write_creates_intermediates() {
        let out = write_at_path(json!({}), &["profile", "links"], "home", json!("https://example.org"));
        assert_eq!(out, json!({"profile": {"links": {"home": "https://example.org"}}}));
    }

    #[test]
    fn test_write_overwrites_non_mapping_intermediate() {
        let root = json!({"profile": "legacy", "keep": 1});
        let out = write_at_path(root, &["profile"], "bio", json!("x"));
        assert_eq!(out, json!({"profile": {"bio": "x"}, "keep": 1}));

        let out = write_at_path(json!([1, 2, 3]), &EMPTY, "k", json!(true));
        assert_eq!(out, json!({"k": true}));
    }

    #[test]
    fn test_remove_at_path() {
        let root = json!({"profile": {"bio": "x", "age": 3}});
        let (out, removed) = remove_at_path(root, &["profile"], "bio");
        assert!(removed);
        assert_eq!(out, json!({"profile": {"age": 3}}));

        let (out, removed) = remove_at_path(out, &["nope"], "bio");
        assert!(!removed);
        assert_eq!(out, json!({"profile": {"age": 3}}));
    }

    #[test]
    fn test_keys_union_stored_and_defaults() {
        let stored = json!({"prefs": {"theme": "dark"}});
        let defaults = json!({"prefs": {"theme": "light", "lang": "en"}});
        let keys = keys_at_path(Some(&stored), Some(&defaults), &["prefs"]);
        assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["lang", "theme"]);

        assert!(keys_at_path(None, None, &["prefs"]).is_empty());
        assert_eq!(keys_at_path(None, Some(&defaults), &["prefs"]).len(), 2);
        assert!(keys_at_path(Some(&json!({"prefs": 3})), None, &["prefs"]).is_empty());
    }

    #[test]
    fn test_stored_scalar_hides_default_keys() {
        let defaults = json!({"prefs": {"theme": "light", "layout": {"cols": 2}}});

        let stored = json!({"prefs": 3});
        assert!(keys_at_path(Some(&stored), Some(&defaults), &["prefs"]).is_empty());

        let stored = json!({"prefs": {"layout": "wide"}});
        assert!(keys_at_path(Some(&stored), Some(&defaults), &["prefs", "layout"]).is_empty());
        assert_eq!(
            keys_at_path(Some(&stored), Some(&defaults), &["prefs"]).into_iter().collect::<Vec<_>>(),
            vec!["layout", "theme"]
        );

        assert!(keys_at_path(Some(&json!("raw")), Some(&defaults), &EMPTY).is_empty());
    }
}
