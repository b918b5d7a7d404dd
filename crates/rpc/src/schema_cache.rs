//! Injected TTL cache for schema introspection results.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

/// Cache key: one remote database's view of one model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    pub endpoint: String,
    pub namespace: String,
    pub model: String,
    pub attributes: Vec<String>,
}

/// Field definitions keyed by (endpoint, namespace, model, attributes).
///
/// Owned by the composition root and handed to clients explicitly; entries for
/// different databases never collide because the key carries both endpoint
/// and namespace.
#[derive(Debug)]
pub struct SchemaCache {
    ttl: Duration,
    inner: RwLock<HashMap<SchemaKey, (Instant, Arc<Map<String, Value>>)>>,
}

impl SchemaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A live entry, if any. Expired entries are treated as absent.
    pub fn get(&self, key: &SchemaKey) -> Option<Arc<Map<String, Value>>> {
        let map = self.inner.read().ok()?;
        let (stored_at, fields) = map.get(key)?;
        if stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(Arc::clone(fields))
    }

    pub fn insert(&self, key: SchemaKey, fields: Map<String, Value>) -> Arc<Map<String, Value>> {
        let fields = Arc::new(fields);
        if let Ok(mut map) = self.inner.write() {
            map.insert(key, (Instant::now(), Arc::clone(&fields)));
        }
        fields
    }

    /// Drop every cached entry for `model`, across databases.
    pub fn invalidate_model(&self, model: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.retain(|k, _| k.model != model);
        }
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        if let Ok(mut map) = self.inner.write() {
            map.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
