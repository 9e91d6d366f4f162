//! Reflective method lookup cache
//!
//! Maps (runtime class, method name, erased parameter types) to the method
//! found for it, or to "no such method". Keys hold their classes weakly; once
//! a class is dropped its keys become dirty and are swept out from time to
//! time on the miss path.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::{debug, trace};

use crate::defaults::{DEFAULT_LOOKUP_CLEANUP_INTERVAL, DEFAULT_LOOKUP_CLEANUP_MISS_STRIDE};
use crate::reflect::{ClassHandle, ClassRef, Method, RawType, Type};

/// Counters of a [`MethodInvocationCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that had to search the class
    pub misses: usize,
    /// Dirty entries removed
    pub evicted: usize,
    /// Entries currently cached
    pub size: usize,
}

struct MethodKey {
    lookup_class: ClassHandle,
    name: String,
    parameter_types: Vec<RawType>,
    hash: u64,
}

impl MethodKey {
    fn new(lookup_class: &ClassRef, name: &str, parameter_types: Vec<RawType>) -> Self {
        let lookup_class = lookup_class.handle();
        let mut hasher = FxHasher::default();
        lookup_class.hash(&mut hasher);
        name.hash(&mut hasher);
        parameter_types.hash(&mut hasher);
        Self {
            lookup_class,
            name: name.to_string(),
            parameter_types,
            hash: hasher.finish(),
        }
    }

    /// A key is dirty once any class it refers to was dropped
    fn is_dirty(&self) -> bool {
        !self.lookup_class.is_live() || self.parameter_types.iter().any(|t| !t.is_live())
    }
}

impl PartialEq for MethodKey {
    fn eq(&self, other: &Self) -> bool {
        if self.is_dirty() && other.is_dirty() {
            return true;
        }
        self.hash == other.hash
            && self.lookup_class == other.lookup_class
            && self.name == other.name
            && self.parameter_types == other.parameter_types
    }
}

impl Eq for MethodKey {}

impl Hash for MethodKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Cache of reflective method lookups, safe for concurrent use
pub struct MethodInvocationCache {
    store: RwLock<FxHashMap<MethodKey, Option<Arc<Method>>>>,
    last_cleanup: Mutex<Instant>,
    cleanup_interval: Duration,
    cleanup_miss_stride: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    evicted: AtomicUsize,
}

impl Default for MethodInvocationCache {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_CLEANUP_INTERVAL, DEFAULT_LOOKUP_CLEANUP_MISS_STRIDE)
    }
}

impl MethodInvocationCache {
    /// Create a cache sweeping dirty entries at most once per
    /// `cleanup_interval`, attempted every `cleanup_miss_stride` misses
    pub fn new(cleanup_interval: Duration, cleanup_miss_stride: usize) -> Self {
        Self {
            store: RwLock::new(FxHashMap::default()),
            last_cleanup: Mutex::new(Instant::now()),
            cleanup_interval,
            cleanup_miss_stride: cleanup_miss_stride.max(1),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            evicted: AtomicUsize::new(0),
        }
    }

    /// Method of `lookup_class` named `name` whose erased parameter types
    /// match those of `parameter_types`
    pub fn get(&self, lookup_class: &ClassRef, name: &str, parameter_types: &[Type]) -> Option<Arc<Method>> {
        let erased: Vec<RawType> = parameter_types.iter().map(Type::erasure).collect();
        let key = MethodKey::new(lookup_class, name, erased);
        if key.is_dirty() {
            // A dropped parameter class: dirty keys all compare equal, so
            // this lookup must not touch the store.
            return lookup_class.find_method(name, &key.parameter_types);
        }

        if let Some(cached) = self.store.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(class = lookup_class.name(), method = name, "method lookup cache hit");
            return cached.clone();
        }

        let mut store = self.store.write();
        if let Some(cached) = store.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached.clone();
        }
        let misses = self.misses.fetch_add(1, Ordering::Relaxed) + 1;
        if misses % self.cleanup_miss_stride == 0 {
            self.remove_dirty_entries(&mut store);
        }
        let method = lookup_class.find_method(name, &key.parameter_types);
        store.insert(key, method.clone());
        method
    }

    fn remove_dirty_entries(&self, store: &mut FxHashMap<MethodKey, Option<Arc<Method>>>) {
        {
            let mut last_cleanup = self.last_cleanup.lock();
            if last_cleanup.elapsed() < self.cleanup_interval {
                return;
            }
            *last_cleanup = Instant::now();
        }
        let before = store.len();
        store.retain(|key, _| !key.is_dirty());
        let removed = before - store.len();
        if removed > 0 {
            self.evicted.fetch_add(removed, Ordering::Relaxed);
            debug!(removed, remaining = store.len(), "removed dirty method lookup entries");
        }
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            size: self.store.read().len(),
        }
    }
}
