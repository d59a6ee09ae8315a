//! In-memory key/value persistence store.
//!
//! The store lives for the host process's lifetime and is discarded on
//! exit; there is no disk backing. It is read and written from two sides:
//! inline handlers on I/O worker threads, and user code executing on the
//! main loop through the facade the host binds into the execution
//! namespace.
//!
//! # Lock invariant
//!
//! The mutex is held only for O(1)-ish map operations, never across I/O
//! and never while a handler runs, so inline persistence calls cannot
//! block on the main loop.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-local mapping from string keys to JSON-representable values.
///
/// Cheap to clone; all clones share one map.
#[derive(Clone, Default)]
pub struct PersistStore {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl PersistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, overwriting any previous entry.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        let mut map = self.lock();
        map.insert(key.into(), value);
    }

    /// Fetch the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Fetch with a fallback: returns `(found, value_or_default)`.
    pub fn get_or(&self, key: &str, default: Value) -> (bool, Value) {
        match self.get(key) {
            Some(value) => (true, value),
            None => (false, default),
        }
    }

    /// Delete `key`; true when an entry was actually removed.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// All keys, sorted for stable output.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.inner.lock().expect("persistence store lock poisoned")
    }
}

impl std::fmt::Debug for PersistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistStore")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_round_trip() {
        let store = PersistStore::new();
        store.put("k", json!({"a": [1, 2, 3]}));
        assert_eq!(store.get("k"), Some(json!({"a": [1, 2, 3]})));
    }

    #[test]
    fn test_put_overwrites() {
        let store = PersistStore::new();
        store.put("k", json!(1));
        store.put("k", json!(2));
        assert_eq!(store.get("k"), Some(json!(2)));
    }

    #[test]
    fn test_remove_then_get_returns_default() {
        let store = PersistStore::new();
        store.put("k", json!("v"));
        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert_eq!(store.get_or("k", Value::Null), (false, Value::Null));
    }

    #[test]
    fn test_keys_are_sorted() {
        let store = PersistStore::new();
        store.put("b", json!(2));
        store.put("a", json!(1));
        store.put("c", json!(3));
        assert_eq!(store.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = PersistStore::new();
        let alias = store.clone();
        alias.put("shared", json!(true));
        assert_eq!(store.get("shared"), Some(json!(true)));
    }

    #[test]
    fn test_concurrent_access() {
        let store = PersistStore::new();
        let mut handles = Vec::new();
        for t in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    store.put(format!("t{t}-{i}"), json!(i));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 800);
    }
}
