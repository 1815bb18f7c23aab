//! Process-lifetime memo tables for Review Board API responses
//!
//! Review Board identifies diff resources by immutable triples
//! (review request, diff revision, filediff). Once a revision exists on the
//! server its content never changes, so anything derived from it can be kept
//! for the rest of the process without invalidation.
//!
//! A [`MemoTable`] maps a resource URL to a shared value. There is no eviction,
//! no TTL and no size bound: memory grows with the number of distinct files a
//! user looks at during one session.
//!
//! # Example
//!
//! ```rust
//! use rb_api_cache::MemoTable;
//!
//! let table: MemoTable<Vec<String>> = MemoTable::new("files");
//! let lines = table.get_or_insert_with("http://rb/api/file/1/", || vec!["a".into()]);
//! assert_eq!(lines.len(), 1);
//! assert_eq!(table.stats().misses, 1);
//! ```

use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Hit/miss counters for a memo table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, Arc<V>>,
    stats: CacheStats,
}

/// A keyed memo table
///
/// Values are stored behind `Arc` so callers can hold on to them without
/// keeping the table locked. The lock is never held while a value is being
/// computed, which means the "compute once" guarantee relies on callers
/// running sequentially (one logical session per process).
#[derive(Debug)]
pub struct MemoTable<V> {
    name: &'static str,
    inner: Mutex<Inner<V>>,
}

impl<V> MemoTable<V> {
    /// Create an empty table. `name` only shows up in log output.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Look up a key without computing anything
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let mut inner = self.inner.lock().unwrap();
        let found = inner.entries.get(key).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
        }
        found
    }

    /// Store a value, replacing nothing if the key is already present
    ///
    /// Returns the value that ends up in the table.
    pub fn insert(&self, key: &str, value: V) -> Arc<V> {
        let mut inner = self.inner.lock().unwrap();
        Arc::clone(
            inner
                .entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(value)),
        )
    }

    /// Return the cached value, or compute, store and return it
    pub fn get_or_insert_with<F>(&self, key: &str, compute: F) -> Arc<V>
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            debug!("{} cache HIT for {}", self.name, key);
            return value;
        }

        debug!("{} cache MISS for {}", self.name, key);
        self.record_miss();
        let value = compute();
        self.insert(key, value)
    }

    /// Fallible async variant of [`MemoTable::get_or_insert_with`]
    ///
    /// Errors are returned to the caller and nothing is stored, so the next
    /// call for the same key computes again.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            debug!("{} cache HIT for {}", self.name, key);
            return Ok(value);
        }

        debug!("{} cache MISS for {}", self.name, key);
        self.record_miss();
        let value = compute().await?;
        Ok(self.insert(key, value))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap().stats
    }

    fn record_miss(&self) {
        self.inner.lock().unwrap().stats.misses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_compute_runs_once_per_key() {
        let table: MemoTable<u32> = MemoTable::new("test");
        let calls = Cell::new(0);

        let compute = || {
            calls.set(calls.get() + 1);
            42
        };
        let first = table.get_or_insert_with("k", compute);
        let second = table.get_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            7
        });

        assert_eq!(*first, 42);
        assert_eq!(*second, 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(table.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_distinct_keys_are_independent() {
        let table: MemoTable<&'static str> = MemoTable::new("test");
        table.get_or_insert_with("a", || "first");
        table.get_or_insert_with("b", || "second");

        assert_eq!(table.len(), 2);
        assert_eq!(*table.get("a").unwrap(), "first");
        assert_eq!(*table.get("b").unwrap(), "second");
        assert!(table.get("c").is_none());
    }

    #[test]
    fn test_insert_keeps_existing_value() {
        let table: MemoTable<u8> = MemoTable::new("test");
        table.insert("k", 1);
        let kept = table.insert("k", 2);
        assert_eq!(*kept, 1);
    }

    #[tokio::test]
    async fn test_async_compute_runs_once() {
        let table: MemoTable<String> = MemoTable::new("test");
        let calls = Arc::new(Mutex::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = table
                .get_or_try_insert_with("url", || async move {
                    *calls.lock().unwrap() += 1;
                    Ok::<_, String>("body".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value.as_str(), "body");
        }

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_compute_is_not_stored() {
        let table: MemoTable<String> = MemoTable::new("test");

        let err = table
            .get_or_try_insert_with("url", || async { Err::<String, _>("offline") })
            .await
            .unwrap_err();
        assert_eq!(err, "offline");
        assert!(table.is_empty());

        let value = table
            .get_or_try_insert_with("url", || async { Ok::<_, &str>("later".to_string()) })
            .await
            .unwrap();
        assert_eq!(value.as_str(), "later");
    }
}
