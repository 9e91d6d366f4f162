//! Adapter options

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::contract::ModelContractRegistry;
use super::target_type::{identity_type_provider, TargetTypeProvider};
use crate::defaults::{DEFAULT_LOOKUP_CLEANUP_INTERVAL, DEFAULT_LOOKUP_CLEANUP_MISS_STRIDE};

/// Options for creating a [`ProtocolToModelAdapter`](super::ProtocolToModelAdapter)
#[derive(Clone)]
pub struct AdapterOptions {
    /// Chooses the view type for each source
    pub type_provider: Arc<dyn TargetTypeProvider>,

    /// Model contract declarations (shared)
    pub contracts: Arc<ModelContractRegistry>,

    /// Minimum time between two sweeps of dead classes from the method
    /// lookup cache
    pub lookup_cleanup_interval: Duration,

    /// A sweep is attempted every this many lookup cache misses
    pub lookup_cleanup_miss_stride: usize,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            type_provider: identity_type_provider(),
            contracts: Arc::new(ModelContractRegistry::new()),
            lookup_cleanup_interval: DEFAULT_LOOKUP_CLEANUP_INTERVAL,
            lookup_cleanup_miss_stride: DEFAULT_LOOKUP_CLEANUP_MISS_STRIDE,
        }
    }
}

impl AdapterOptions {
    /// Create options with a target type provider
    pub fn with_type_provider<P: TargetTypeProvider + 'static>(provider: P) -> Self {
        Self {
            type_provider: Arc::new(provider),
            ..Default::default()
        }
    }

    /// Create options with model contract declarations
    pub fn with_contracts(contracts: Arc<ModelContractRegistry>) -> Self {
        Self {
            contracts,
            ..Default::default()
        }
    }

    /// Create options with a lookup cache cleanup interval
    pub fn with_lookup_cleanup_interval(interval: Duration) -> Self {
        Self {
            lookup_cleanup_interval: interval,
            ..Default::default()
        }
    }
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("contracts", &self.contracts)
            .field("lookup_cleanup_interval", &self.lookup_cleanup_interval)
            .field("lookup_cleanup_miss_stride", &self.lookup_cleanup_miss_stride)
            .finish_non_exhaustive()
    }
}
