use serde_json::{Map, Value};

/// Deep-merges configured defaults under a value that was actually read.
///
/// A missing stored value yields the default. When either side is not a
/// mapping (arrays included) the stored side wins outright. Two mappings merge
/// key by key, keeping stored-only keys. Merging happens on read only; nothing
/// produced here is written back.
pub fn merge(default: &Value, stored: Option<Value>) -> Value {
    let Some(stored) = stored else {
        return default.clone();
    };
    match (default, stored) {
        (Value::Object(default_map), Value::Object(mut stored_map)) => {
            let mut merged = Map::with_capacity(default_map.len().max(stored_map.len()));
            for (key, default_value) in default_map {
                merged.insert(key.clone(), merge(default_value, stored_map.remove(key)));
            }
            merged.extend(stored_map);
            Value::Object(merged)
        }
        (_, stored) => stored,
    }
}

/// Applies an optional default to an optional stored value.
pub fn resolve(default: Option<&Value>, stored: Option<Value>) -> Option<Value> {
    match default {
        Some(default) => Some(merge(default, stored)),
        None => stored,
    }
}
