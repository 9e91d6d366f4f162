//! Weakly keyed identity map
//!
//! Keys are compared by address, never by value, and are held weakly: the map
//! never keeps a key alive. Entries whose key was dropped are swept out as the
//! map is used.

use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use rustc_hash::FxHasher;

use crate::defaults::MIN_WEAK_MAP_SWEEP_INTERVAL;

struct WeakKey<K: ?Sized> {
    referent: Weak<K>,
    address: usize,
}

impl<K: ?Sized> WeakKey<K> {
    fn new(key: &Arc<K>) -> Self {
        Self {
            referent: Arc::downgrade(key),
            address: Arc::as_ptr(key).cast::<()>() as usize,
        }
    }

    fn is_live(&self) -> bool {
        self.referent.strong_count() > 0
    }
}

impl<K: ?Sized> PartialEq for WeakKey<K> {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && Weak::ptr_eq(&self.referent, &other.referent)
    }
}

impl<K: ?Sized> Eq for WeakKey<K> {}

impl<K: ?Sized> Hash for WeakKey<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.address);
    }
}

/// Concurrent map keyed by object identity, holding its keys weakly
pub struct WeakIdentityHashMap<K: ?Sized, V> {
    entries: DashMap<WeakKey<K>, V, BuildHasherDefault<FxHasher>>,
    operations: AtomicUsize,
}

impl<K: ?Sized, V> Default for WeakIdentityHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ?Sized, V> WeakIdentityHashMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(BuildHasherDefault::default()),
            operations: AtomicUsize::new(0),
        }
    }

    /// Associate `value` with `key`, returning the previous value
    pub fn put(&self, key: &Arc<K>, value: V) -> Option<V> {
        self.maybe_expunge();
        self.entries.insert(WeakKey::new(key), value)
    }

    /// Value for `key`
    pub fn get(&self, key: &Arc<K>) -> Option<V>
    where
        V: Clone,
    {
        self.maybe_expunge();
        self.entries.get(&WeakKey::new(key)).map(|v| v.value().clone())
    }

    /// Value for `key`, created by `provider` if absent. Atomic: concurrent
    /// callers for the same key all get the value of the single winner.
    pub fn compute_if_absent<F>(&self, key: &Arc<K>, provider: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        self.maybe_expunge();
        self.entries
            .entry(WeakKey::new(key))
            .or_insert_with(provider)
            .value()
            .clone()
    }

    /// Remove `key`, returning its value
    pub fn remove(&self, key: &Arc<K>) -> Option<V> {
        self.maybe_expunge();
        self.entries.remove(&WeakKey::new(key)).map(|(_, v)| v)
    }

    /// Number of live entries
    pub fn size(&self) -> usize {
        self.expunge_stale_entries();
        self.entries.len()
    }

    /// Whether there are no live entries
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every entry whose key is no longer alive
    pub fn expunge_stale_entries(&self) {
        self.operations.store(0, Ordering::Relaxed);
        self.entries.retain(|key, _| key.is_live());
    }

    fn maybe_expunge(&self) {
        let operations = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        if operations >= self.entries.len().max(MIN_WEAK_MAP_SWEEP_INTERVAL) {
            self.expunge_stale_entries();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_not_equality() {
        let map = WeakIdentityHashMap::new();
        let a = Arc::new(String::from("same"));
        let b = Arc::new(String::from("same"));
        map.put(&a, 1);
        map.put(&b, 2);
        assert_eq!(map.get(&a), Some(1));
        assert_eq!(map.get(&b), Some(2));
        assert_eq!(map.size(), 2);
    }

    #[test]
    fn test_dropped_keys_are_expunged() {
        let map = WeakIdentityHashMap::new();
        let kept = Arc::new(1);
        map.put(&kept, "kept");
        {
            let dropped = Arc::new(2);
            map.put(&dropped, "dropped");
            assert_eq!(map.size(), 2);
        }
        assert_eq!(map.size(), 1);
        assert_eq!(map.remove(&kept), Some("kept"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_compute_if_absent() {
        let map = WeakIdentityHashMap::new();
        let key = Arc::new(());
        assert_eq!(map.compute_if_absent(&key, || 1), 1);
        assert_eq!(map.compute_if_absent(&key, || 2), 1);
    }

    #[test]
    fn test_amortized_sweep() {
        let map: WeakIdentityHashMap<i32, i32> = WeakIdentityHashMap::new();
        for i in 0..100 {
            let temp = Arc::new(i);
            map.put(&temp, i);
        }
        // Stale entries never pile up past the sweep interval.
        assert!(map.entries.len() <= MIN_WEAK_MAP_SWEEP_INTERVAL);
        assert_eq!(map.size(), 0);
    }
}
