//! Cache backed by a shared key-value store.

use konfig_rs_core::ConfigCache;
use log::{error, warn};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default namespace for remote cache keys.
pub const REMOTE_CACHE_PREFIX: &str = "config:";

/// Failure reported by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Minimal string key-value store, e.g. a Redis connection.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Keys starting with `prefix`.
    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys(prefix)
    }
}

/// Cache storing values as JSON text under a key prefix. Store failures are
/// logged and read as misses.
#[derive(Debug)]
pub struct RemoteCache<S> {
    store: S,
    prefix: String,
}

impl<S: KeyValueStore> RemoteCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_prefix(store, REMOTE_CACHE_PREFIX)
    }

    pub fn with_prefix(store: S, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl<S: KeyValueStore> ConfigCache for RemoteCache<S> {
    fn get(&self, key: &str) -> Option<Value> {
        let full_key = self.full_key(key);
        let text = match self.store.get(&full_key) {
            Ok(text) => text?,
            Err(err) => {
                error!("remote cache get failed (key={}): {}", full_key, err);
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("remote cache entry is not JSON (key={}): {}", full_key, err);
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let full_key = self.full_key(key);
        let text = match serde_json::to_string(&value) {
            Ok(text) => text,
            Err(err) => {
                error!("remote cache encode failed (key={}): {}", full_key, err);
                return;
            }
        };
        if let Err(err) = self.store.set(&full_key, text, ttl) {
            error!("remote cache set failed (key={}): {}", full_key, err);
        }
    }

    fn invalidate(&self, key: &str) {
        let full_key = self.full_key(key);
        if let Err(err) = self.store.delete(&full_key) {
            error!("remote cache delete failed (key={}): {}", full_key, err);
        }
    }

    fn clear(&self) {
        let keys = match self.store.keys(&self.prefix) {
            Ok(keys) => keys,
            Err(err) => {
                error!("remote cache clear failed (prefix={}): {}", self.prefix, err);
                return;
            }
        };
        for key in keys {
            if let Err(err) = self.store.delete(&key) {
                error!("remote cache delete failed (key={}): {}", key, err);
            }
        }
    }
}

/// In-process [`KeyValueStore`], shareable between caches through `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock();
        let expired = matches!(
            entries.get(key),
            Some((_, Some(deadline))) if Instant::now() >= *deadline
        );
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(text, _)| text.clone()))
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let deadline = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .insert(key.to_string(), (value, deadline));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryStore, KeyValueStore, RemoteCache};
    use konfig_rs_core::ConfigCache;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn values_are_stored_as_prefixed_json() {
        let store = Arc::new(InMemoryStore::new());
        let cache = RemoteCache::new(Arc::clone(&store));
        cache.set("pool", json!({ "size": 5 }), None);

        assert_eq!(
            store.get("config:pool").expect("get"),
            Some(r#"{"size":5}"#.to_string())
        );
        assert_eq!(cache.get("pool"), Some(json!({ "size": 5 })));
    }

    #[test]
    fn clear_only_touches_own_namespace() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set("session:abc", "1".to_string(), None)
            .expect("set");
        let cache = RemoteCache::with_prefix(Arc::clone(&store), "app:");
        cache.set("a", json!(1), None);
        cache.set("b", json!(2), None);
        cache.clear();

        assert_eq!(cache.get("a"), None);
        assert_eq!(store.keys("").expect("keys"), vec!["session:abc".to_string()]);
    }

    #[test]
    fn non_json_entries_read_as_miss() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set("config:broken", "{oops".to_string(), None)
            .expect("set");
        let cache = RemoteCache::new(store);
        assert_eq!(cache.get("broken"), None);
    }
}
