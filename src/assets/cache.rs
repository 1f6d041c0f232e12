use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::error::BezelResult;

/// Key -> value store with compute-if-absent semantics.
///
/// Hosts own their caches and hand them to the session, so tests can start each case from a
/// fresh cache instead of sharing process-wide state.
pub trait KeyedCache<V> {
    /// Return the cached value for `key`, if any.
    fn get(&self, key: &str) -> Option<Arc<V>>;
    /// Store `value` under `key`, replacing any previous value.
    fn insert(&mut self, key: String, value: Arc<V>);
    /// Number of cached values.
    fn len(&self) -> usize;
    /// Return `true` when nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> dyn KeyedCache<V> + '_ {
    /// Return the cached value, computing and storing it on a miss.
    ///
    /// A failed computation leaves the cache untouched.
    pub fn get_or_try_insert_with(
        &mut self,
        key: &str,
        compute: impl FnOnce() -> BezelResult<V>,
    ) -> BezelResult<Arc<V>> {
        if let Some(v) = self.get(key) {
            tracing::trace!(key, "cache hit");
            return Ok(v);
        }
        tracing::debug!(key, "cache miss");
        let v = Arc::new(compute()?);
        self.insert(key.to_string(), v.clone());
        Ok(v)
    }
}

/// Unbounded in-memory cache; bounded in practice by the catalog size.
#[derive(Debug)]
pub struct MemoryCache<V> {
    map: HashMap<String, Arc<V>>,
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<V> MemoryCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V> KeyedCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<Arc<V>> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: String, value: Arc<V>) {
        self.map.insert(key, value);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
