//! Proxy class cache
//!
//! Views implementing the same interfaces share one proxy class. The cache
//! holds those classes weakly, so a proxy class, and with it the interfaces
//! it implements, lives only as long as one of its views.

use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use rustc_hash::FxHasher;
use tracing::debug;

use crate::defaults::MIN_WEAK_MAP_SWEEP_INTERVAL;
use crate::reflect::{Class, ClassId, ClassRef};

/// Proxy classes keyed by the ids of their interfaces, in order
#[derive(Default)]
pub(crate) struct ProxyClassCache {
    classes: DashMap<Vec<ClassId>, Weak<Class>, BuildHasherDefault<FxHasher>>,
    operations: AtomicUsize,
}

impl ProxyClassCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The proxy class implementing exactly `interfaces`, in order
    pub(crate) fn get_or_create(&self, interfaces: Vec<ClassRef>) -> ClassRef {
        self.maybe_prune();
        let key: Vec<ClassId> = interfaces.iter().map(|i| i.id()).collect();
        let mut entry = self.classes.entry(key).or_default();
        if let Some(class) = entry.upgrade() {
            return class;
        }
        let class = Class::proxy(interfaces);
        *entry = Arc::downgrade(&class);
        class
    }

    /// Number of live proxy classes
    pub(crate) fn len(&self) -> usize {
        self.prune();
        self.classes.len()
    }

    fn prune(&self) {
        self.operations.store(0, Ordering::Relaxed);
        let before = self.classes.len();
        self.classes.retain(|_, class| class.strong_count() > 0);
        let removed = before.saturating_sub(self.classes.len());
        if removed > 0 {
            debug!(removed, "removed dead proxy classes");
        }
    }

    fn maybe_prune(&self) {
        let operations = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
        if operations >= self.classes.len().max(MIN_WEAK_MAP_SWEEP_INTERVAL) {
            self.prune();
        }
    }
}
